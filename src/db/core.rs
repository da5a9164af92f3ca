//! db/core — структура Store, открытие/закрытие и блокировки.
//!
//! - Writer (`open`): эксклюзивный fs2-lock на <base>/LOCK, недостающие
//!   страницы 0 создаются.
//! - Reader (`open_ro`): разделяемый lock; хранилище должно существовать,
//!   мутации возвращают `StoreError::ReadOnly`.

use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::config::StoreConfig;
use crate::dir::Directory;
use crate::error::{IoContext, Result, StoreError};
use crate::lock::{try_acquire_lock, LockGuard, LockMode};
use crate::page::PageSettings;
use crate::schema::Schema;

pub struct Store {
    pub(crate) cfg: StoreConfig,
    pub(crate) dir: Directory,
    pub(crate) readonly: bool,
    // держим дескриптор до Drop
    pub(crate) _lock: LockGuard,
}

impl Store {
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        Self::open_mode(cfg, false)
    }

    pub fn open_ro(cfg: StoreConfig) -> Result<Self> {
        Self::open_mode(cfg, true)
    }

    fn open_mode(cfg: StoreConfig, readonly: bool) -> Result<Self> {
        cfg.validate()?;
        let root = cfg.base_path.clone();
        if !readonly && !root.exists() {
            std::fs::create_dir_all(&root).at(&root)?;
        }

        let mode = if readonly { LockMode::Shared } else { LockMode::Exclusive };
        let lock = try_acquire_lock(&root, mode)?;

        let settings = Arc::new(PageSettings {
            root: root.clone(),
            table: cfg.table.clone(),
            max_size: cfg.max_page_size,
            data_fsync: cfg.data_fsync,
            schema: cfg.schema.clone(),
        });

        // Заголовок, не влезающий в страницу, сделал бы любую новую страницу
        // сразу полной — overflow-страницы плодились бы без конца.
        let header_len = settings.header_bytes()?.len() as u64;
        if header_len >= cfg.max_page_size {
            return Err(StoreError::Config(format!(
                "page header of {} B does not fit max_page_size={}",
                header_len, cfg.max_page_size
            )));
        }

        let dir = Directory::open(settings, cfg.num_buckets, !readonly, cfg.mem_keydir)?;
        info!(
            "opened store at {} ({}; {} buckets, max_page_size={}, keydir={})",
            root.display(),
            if readonly { "read-only" } else { "writer" },
            cfg.num_buckets,
            cfg.max_page_size,
            cfg.mem_keydir
        );

        Ok(Self {
            cfg,
            dir,
            readonly,
            _lock: lock,
        })
    }

    /// Сбросить страницы на диск и освободить lock.
    pub fn close(self) -> Result<()> {
        self.flush()?;
        info!("closed store at {}", self.cfg.base_path.display());
        Ok(())
    }

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.cfg.schema
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.cfg.base_path
    }

    #[inline]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    #[inline]
    pub fn bucket_count(&self) -> u32 {
        self.dir.bucket_count()
    }

    #[inline]
    pub fn directory(&self) -> &Directory {
        &self.dir
    }

    /// `int(key) mod N`; InvalidKey, если ключ — не неотрицательное целое.
    pub fn bucket_of(&self, key: &str) -> Result<u32> {
        self.dir.bucket_of_key(key)
    }

    /// Число страниц бакета (0 + overflow).
    pub fn page_count(&self, bucket: u32) -> Result<usize> {
        Ok(self.dir.bucket(bucket)?.read().page_count())
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }
}
