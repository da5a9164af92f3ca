#![allow(non_snake_case)]

// Базовые модули
pub mod consts;
pub mod error;
pub mod config;
pub mod metrics;
pub mod lock;

// Схема и кодирование записей
pub mod schema;
pub mod codec;

// Маршрутизация ключей, страницы, каталог бакетов
pub mod hash;
pub mod page;   // src/page/{mod,common,rows,ops}.rs
pub mod dir;

// High-level API
pub mod db;     // src/db/{mod,core,kv,scan}.rs

// Удобные реэкспорты
pub use codec::{decode, encode, normalize, EncodedRow, Record};
pub use config::{StoreBuilder, StoreConfig};
pub use db::{ScanOptions, Store, StoreStats};
pub use dir::{Bucket, Directory};
pub use error::{Result, StoreError};
pub use page::Page;
pub use schema::{FieldSpec, FieldType, Schema};
