//! Centralized configuration and builder for BucketDB.
//!
//! Goals:
//! - Single explicit struct instead of global paths/constants: base directory,
//!   page capacity, bucket count and schema travel together into `Store::open`.
//! - `StoreConfig::from_env()` overrides tunables from BDB_* env vars.
//! - `StoreBuilder` returns a config or opens the store directly.
//!
//! Defaults follow the on-disk layout of existing stores:
//! - max_page_size = 4096, num_buckets = 10, table = "db"
//! - mem_keydir = true (existence index per bucket, rebuilt at open)
//! - data_fsync = false (fsync only on page rewrites and flush())
//! - strict_fields = false (missing fields are written as empty strings)

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::consts::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_NUM_BUCKETS, DEFAULT_TABLE};
use crate::db::Store;
use crate::error::{Result, StoreError};
use crate::schema::Schema;

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Root directory holding the page files.
    pub base_path: PathBuf,

    /// Nominal page capacity in bytes; checked before each append.
    /// Env: BDB_MAX_PAGE_SIZE (default 4096)
    pub max_page_size: u64,

    /// Partition count; fixed for the lifetime of the store files.
    /// Env: BDB_NUM_BUCKETS (default 10)
    pub num_buckets: u32,

    pub schema: Arc<Schema>,

    /// Base name of page files (`<table>_<bucket>[_<index>].csv`).
    /// Env: BDB_TABLE (default "db")
    pub table: String,

    /// Keep an in-memory key -> page index map per bucket.
    /// Off: every duplicate check/update/delete scans the whole bucket.
    /// Env: BDB_MEM_KEYDIR = 0|1 (default 1)
    pub mem_keydir: bool,

    /// fsync page files after every append.
    /// Env: BDB_DATA_FSYNC = 0|1 (default 0)
    pub data_fsync: bool,

    /// Reject records that omit schema fields instead of writing "".
    /// Env: BDB_STRICT_FIELDS = 0|1 (default 0)
    pub strict_fields: bool,
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        let s = v.trim().to_ascii_lowercase();
        s == "1" || s == "true" || s == "yes" || s == "on"
    })
}

impl StoreConfig {
    pub fn new<P: Into<PathBuf>>(base_path: P, schema: Schema) -> Self {
        Self {
            base_path: base_path.into(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            num_buckets: DEFAULT_NUM_BUCKETS,
            schema: Arc::new(schema),
            table: DEFAULT_TABLE.to_string(),
            mem_keydir: true,
            data_fsync: false,
            strict_fields: false,
        }
    }

    /// Defaults overridden by environment variables.
    pub fn from_env<P: Into<PathBuf>>(base_path: P, schema: Schema) -> Self {
        let mut cfg = Self::new(base_path, schema);

        if let Ok(v) = std::env::var("BDB_MAX_PAGE_SIZE") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.max_page_size = n;
            }
        }
        if let Ok(v) = std::env::var("BDB_NUM_BUCKETS") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.num_buckets = n;
            }
        }
        if let Ok(v) = std::env::var("BDB_TABLE") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.table = s.to_string();
            }
        }
        if let Some(on) = env_flag("BDB_MEM_KEYDIR") {
            cfg.mem_keydir = on;
        }
        if let Some(on) = env_flag("BDB_DATA_FSYNC") {
            cfg.data_fsync = on;
        }
        if let Some(on) = env_flag("BDB_STRICT_FIELDS") {
            cfg.strict_fields = on;
        }

        cfg
    }

    pub fn with_max_page_size(mut self, bytes: u64) -> Self {
        self.max_page_size = bytes;
        self
    }

    pub fn with_num_buckets(mut self, n: u32) -> Self {
        self.num_buckets = n;
        self
    }

    pub fn with_table<S: Into<String>>(mut self, table: S) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_mem_keydir(mut self, on: bool) -> Self {
        self.mem_keydir = on;
        self
    }

    pub fn with_data_fsync(mut self, on: bool) -> Self {
        self.data_fsync = on;
        self
    }

    pub fn with_strict_fields(mut self, on: bool) -> Self {
        self.strict_fields = on;
        self
    }

    pub fn build(self) -> Self {
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Проверка инвариантов, не зависящих от файлов на диске.
    pub fn validate(&self) -> Result<()> {
        if self.num_buckets == 0 {
            return Err(StoreError::Config("num_buckets must be > 0".into()));
        }
        if self.max_page_size == 0 {
            return Err(StoreError::Config("max_page_size must be > 0".into()));
        }
        let t = self.table.as_str();
        if t.is_empty() || t.contains(|c| c == '/' || c == '\\') || t == "." || t == ".." {
            return Err(StoreError::Config(format!("invalid table name '{}'", t)));
        }
        Ok(())
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StoreConfig {{ \
             base_path: {}, \
             max_page_size: {}, \
             num_buckets: {}, \
             table: {}, \
             mem_keydir: {}, \
             data_fsync: {}, \
             strict_fields: {}, \
             schema: {} \
             }}",
            self.base_path.display(),
            self.max_page_size,
            self.num_buckets,
            self.table,
            self.mem_keydir,
            self.data_fsync,
            self.strict_fields,
            self.schema,
        )
    }
}

/// Lightweight builder over StoreConfig (starts from env, like `StoreConfig::from_env`).
#[derive(Clone, Debug)]
pub struct StoreBuilder {
    cfg: StoreConfig,
}

impl StoreBuilder {
    pub fn new<P: Into<PathBuf>>(base_path: P, schema: Schema) -> Self {
        Self {
            cfg: StoreConfig::from_env(base_path, schema),
        }
    }

    /// Start from clean defaults (without reading env).
    pub fn from_default<P: Into<PathBuf>>(base_path: P, schema: Schema) -> Self {
        Self {
            cfg: StoreConfig::new(base_path, schema),
        }
    }

    pub fn max_page_size(mut self, bytes: u64) -> Self {
        self.cfg.max_page_size = bytes;
        self
    }

    pub fn num_buckets(mut self, n: u32) -> Self {
        self.cfg.num_buckets = n;
        self
    }

    pub fn table<S: Into<String>>(mut self, table: S) -> Self {
        self.cfg.table = table.into();
        self
    }

    pub fn mem_keydir(mut self, on: bool) -> Self {
        self.cfg.mem_keydir = on;
        self
    }

    pub fn data_fsync(mut self, on: bool) -> Self {
        self.cfg.data_fsync = on;
        self
    }

    pub fn strict_fields(mut self, on: bool) -> Self {
        self.cfg.strict_fields = on;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.cfg
    }

    pub fn open(self) -> Result<Store> {
        Store::open(self.cfg)
    }

    pub fn open_ro(self) -> Result<Store> {
        Store::open_ro(self.cfg)
    }
}
