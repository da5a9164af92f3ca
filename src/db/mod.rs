//! db — high-level API хранилища (Store).
//!
//! Разделение по подмодулям:
//! - core.rs — структура Store, open/open_ro/close, lock-хэндлинг, маршрутизация ключа
//! - kv.rs   — точечные операции write/read/update/delete (+ insert/get)
//! - scan.rs — полный скан с фильтром/проекцией, flush, статистика

pub mod core;
pub mod kv;
pub mod scan;

pub use self::core::Store;
pub use self::scan::{BucketStats, PageStats, ScanOptions, StoreStats};
