//! Единый тип ошибок хранилища.
//!
//! Библиотека возвращает `Result<T, StoreError>`; бинарь и тесты оборачивают
//! его в anyhow с контекстом. Автоматических повторов нет: ошибка всегда
//! доходит до непосредственного вызывающего.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Ключ уже есть в одной из страниц бакета; запись отклонена без изменений.
    #[error("duplicate key '{key}' in bucket {bucket}")]
    DuplicateKey { key: String, bucket: u32 },

    /// Ключ не является неотрицательным целым (только ASCII-цифры).
    #[error("invalid key '{key}': expected a non-negative integer")]
    InvalidKey { key: String },

    /// Запись для update несёт другой ключ.
    #[error("update for key '{key}' carries a different key '{found}'")]
    KeyMismatch { key: String, found: String },

    /// Одна строка сама по себе не помещается в страницу.
    #[error(
        "row of {row_bytes} B does not fit page {bucket}/{page_index} (max_page_size={max_size})"
    )]
    PageCapacityExceeded {
        bucket: u32,
        page_index: u32,
        row_bytes: u64,
        max_size: u64,
    },

    /// Запись не содержит поля схемы (только в strict-режиме).
    #[error("record is missing schema field '{field}'")]
    SchemaFieldMissing { field: String },

    #[error("I/O on {}: {source}", path.display())]
    BackingStoreIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed page {}: {source}", path.display())]
    BackingStoreFormat {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("page {} header {found:?} does not match schema {expected:?}", path.display())]
    HeaderMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("schema: {0}")]
    Schema(String),

    #[error("config: {0}")]
    Config(String),

    #[error("store is read-only")]
    ReadOnly,
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StoreError::BackingStoreIo {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn format(path: &Path, source: csv::Error) -> Self {
        // csv оборачивает io::Error — отдаём его как I/O, а не как формат.
        if source.is_io_error() {
            if let csv::ErrorKind::Io(e) = source.into_kind() {
                return StoreError::io(path, e);
            }
            return StoreError::io(path, io::Error::new(io::ErrorKind::Other, "csv i/o"));
        }
        StoreError::BackingStoreFormat {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Ошибка вызвана данными вызывающего (а не состоянием хранилища).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateKey { .. }
                | StoreError::InvalidKey { .. }
                | StoreError::KeyMismatch { .. }
                | StoreError::SchemaFieldMissing { .. }
                | StoreError::PageCapacityExceeded { .. }
        )
    }
}

/// Контекст пути для io::Result — аналог anyhow::Context в библиотечном коде.
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::result::Result<T, io::Error> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|e| StoreError::io(path, e))
    }
}
