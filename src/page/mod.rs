//! page — единица хранения: один CSV-файл на (bucket_id, page_index).
//!
//! Layout файла: строка заголовка (имена полей в порядке схемы), затем по одной
//! закодированной записи на строку.
//!
//! Разделение по подмодулям:
//! - common.rs — имена файлов, CSV-диалект, атомарная перезапись (tmp+rename).
//! - rows.rs   — разбор файла в образ со смещениями строк.
//! - ops.rs    — операции страницы: write/read/update/delete/scan.
//!
//! Жизненный цикл: absent → active (принимает запись) → full (только
//! read/update/delete). Переходы монотонны: страница не становится снова
//! доступной для записи, даже если delete уменьшил её размер — запись всегда
//! идёт в последнюю страницу бакета.

pub mod common;
pub mod ops;
pub mod rows;

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::error::{IoContext, Result};
use crate::schema::Schema;

pub use common::{page_file_name, page_path, serialize_row};
pub use rows::{PageImage, StoredRow};

/// Параметры, общие для всех страниц одного хранилища.
#[derive(Debug)]
pub struct PageSettings {
    pub root: PathBuf,
    pub table: String,
    pub max_size: u64,
    pub data_fsync: bool,
    pub schema: Arc<Schema>,
}

impl PageSettings {
    /// Байты строки заголовка для этой схемы.
    pub fn header_bytes(&self) -> Result<Vec<u8>> {
        serialize_row(&self.root, self.schema.field_names())
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    bucket_id: u32,
    page_index: u32,
    path: PathBuf,
    settings: Arc<PageSettings>,
}

impl Page {
    /// Описатель страницы без обращения к диску.
    pub fn new(settings: Arc<PageSettings>, bucket_id: u32, page_index: u32) -> Self {
        let path = page_path(&settings.root, &settings.table, bucket_id, page_index);
        Self {
            bucket_id,
            page_index,
            path,
            settings,
        }
    }

    /// Открыть страницу, создав файл с заголовком при отсутствии.
    pub fn open(settings: Arc<PageSettings>, bucket_id: u32, page_index: u32) -> Result<Self> {
        let page = Self::new(settings, bucket_id, page_index);
        page.create_if_absent()?;
        Ok(page)
    }

    #[inline]
    pub fn bucket_id(&self) -> u32 {
        self.bucket_id
    }

    #[inline]
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn max_size(&self) -> u64 {
        self.settings.max_size
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.settings.schema
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Создать файл с заголовком, если его нет. Возвращает true, если файл создан.
    /// Существующий файл не трогается, но его заголовок сверяется со схемой.
    pub fn create_if_absent(&self) -> Result<bool> {
        let header = self.settings.header_bytes()?;
        match OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&self.path)
        {
            Ok(mut f) => {
                f.write_all(&header).at(&self.path)?;
                f.sync_all().at(&self.path)?;
                debug!(
                    "page {}/{} created at {}",
                    self.bucket_id,
                    self.page_index,
                    self.path.display()
                );
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // parse сверяет заголовок со схемой
                self.load()?;
                Ok(false)
            }
            Err(e) => Err(e).at(&self.path),
        }
    }

    /// Текущий размер файла на диске (байт).
    pub fn size(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path).at(&self.path)?.len())
    }

    /// Ёмкость проверяется до записи: страница полна, когда size >= max_size.
    pub fn is_full(&self) -> Result<bool> {
        Ok(self.size()? >= self.settings.max_size)
    }

    /// Прочитать и разобрать файл целиком.
    pub fn load(&self) -> Result<PageImage> {
        let bytes = std::fs::read(&self.path).at(&self.path)?;
        PageImage::parse(&self.path, bytes, &self.settings.schema)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::schema::FieldSpec;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static NEXT_ID: AtomicU64 = AtomicU64::new(1);

    pub fn unique_root(prefix: &str) -> PathBuf {
        let pid = std::process::id();
        let t = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!("bdb-unit-{prefix}-{pid}-{t}-{id}"));
        std::fs::create_dir_all(&root).unwrap();
        root
    }

    pub fn settings(root: &Path, max_size: u64) -> Arc<PageSettings> {
        let schema = Schema::new(
            vec![FieldSpec::int("user_id"), FieldSpec::text("username").fixed(10)],
            "user_id",
        )
        .unwrap();
        Arc::new(PageSettings {
            root: root.to_path_buf(),
            table: "db".into(),
            max_size,
            data_fsync: false,
            schema: Arc::new(schema),
        })
    }
}
