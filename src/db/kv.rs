//! db/kv — точечные операции write/read/update/delete для Store.
//!
//! Протокол записи (check-then-act под эксклюзивным lock бакета):
//! 1) ключ → бакет (`int(key) mod N`), InvalidKey при мусоре;
//! 2) строка длиннее max_page_size сама по себе → PageCapacityExceeded;
//! 3) ключ уже есть в любой странице бакета → DuplicateKey, без изменений;
//! 4) append в последнюю страницу, при заполнении — новая overflow-страница.
//!
//! Чтения берут lock бакета на чтение; разные бакеты не блокируют друг друга.

use log::{debug, warn};

use crate::codec::{check_fields, encode, EncodedRow, Record};
use crate::error::{Result, StoreError};
use crate::hash::{bucket_of_digits, check_key};
use crate::metrics::{
    record_delete, record_duplicate_reject, record_read, record_update, record_write,
};
use crate::page::serialize_row;

use super::core::Store;

impl Store {
    /// Записать новую запись. Возвращает ключ в том виде, в каком он сохранён
    /// (trim, без разбора в число: "007" остаётся "007").
    pub fn write(&self, record: &Record) -> Result<String> {
        self.ensure_writable()?;
        let (key, row) = self.prepare_row(record, None)?;
        let bucket_id = bucket_of_digits(&key, self.bucket_count());

        let row_bytes = serialize_row(self.root(), row.values())?.len() as u64;
        let max_size = self.cfg.max_page_size;

        let lock = self.dir.bucket(bucket_id)?;
        let mut bucket = lock.write();
        if row_bytes > max_size {
            return Err(StoreError::PageCapacityExceeded {
                bucket: bucket_id,
                page_index: bucket.last_page().page_index(),
                row_bytes,
                max_size,
            });
        }
        if bucket.locate(&key)?.is_some() {
            record_duplicate_reject();
            warn!("write rejected: key '{}' already exists in bucket {}", key, bucket_id);
            return Err(StoreError::DuplicateKey {
                key,
                bucket: bucket_id,
            });
        }

        let page_index = bucket.append(&key, &row)?;
        record_write();
        debug!("write key '{}' -> bucket {} page {}", key, bucket_id, page_index);
        Ok(key)
    }

    /// Контрактный алиас write (insert из внешнего storage-интерфейса).
    pub fn insert(&self, record: &Record) -> Result<String> {
        self.write(record)
    }

    /// Прочитать запись в хранимом виде (поля фиксированной длины — с паддингом).
    pub fn read(&self, key: &str) -> Result<Option<Record>> {
        let bucket_id = self.bucket_of(key)?;
        let bucket = self.dir.bucket(bucket_id)?.read();
        let out = bucket.read(key)?;
        record_read();
        debug!(
            "read key '{}' in bucket {}: {}",
            key.trim(),
            bucket_id,
            if out.is_some() { "hit" } else { "miss" }
        );
        Ok(out)
    }

    pub fn get(&self, key: &str) -> Result<Option<Record>> {
        self.read(key)
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        let bucket_id = self.bucket_of(key)?;
        let bucket = self.dir.bucket(bucket_id)?.read();
        Ok(bucket.locate(key)?.is_some())
    }

    /// Заменить запись с ключом `key`. Поле ключа в `record` обязано совпадать
    /// с `key` (если его нет — подставляется). true — если запись найдена.
    pub fn update(&self, key: &str, record: &Record) -> Result<bool> {
        self.ensure_writable()?;
        let bucket_id = self.bucket_of(key)?;
        let (_, row) = self.prepare_row(record, Some(key))?;

        let mut bucket = self.dir.bucket(bucket_id)?.write();
        let hit = bucket.update(key, &row)?;
        if hit {
            record_update();
        }
        debug!("update key '{}' in bucket {}: hit={}", key.trim(), bucket_id, hit);
        Ok(hit)
    }

    /// Удалить запись. true — если она была.
    pub fn delete(&self, key: &str) -> Result<bool> {
        self.ensure_writable()?;
        let bucket_id = self.bucket_of(key)?;
        let mut bucket = self.dir.bucket(bucket_id)?.write();
        let hit = bucket.delete(key)?;
        if hit {
            record_delete();
        }
        debug!("delete key '{}' in bucket {}: hit={}", key.trim(), bucket_id, hit);
        Ok(hit)
    }

    /// Закодировать запись и извлечь её ключ.
    ///
    /// - strict_fields: отсутствующее поле → SchemaFieldMissing;
    /// - ключ после кодирования обязан совпасть с исходным (иначе он был бы
    ///   усечён/искажён и запись стала бы недостижимой) → InvalidKey;
    /// - `expect_key` (update): ключ записи должен совпасть → KeyMismatch.
    fn prepare_row(&self, record: &Record, expect_key: Option<&str>) -> Result<(String, EncodedRow)> {
        let schema = self.schema();
        let key_field = schema.key_field();

        let filled;
        let record = match (expect_key, record.contains_key(key_field)) {
            (Some(k), false) => {
                let mut r = record.clone();
                r.insert(key_field.to_string(), k.trim().to_string());
                filled = r;
                &filled
            }
            _ => record,
        };

        if self.cfg.strict_fields {
            check_fields(record, schema)?;
        }

        let raw_key = record.get(key_field).map(|s| s.trim()).unwrap_or("");
        let row = encode(record, schema);
        let key = row.key(schema).trim().to_string();
        if key != raw_key {
            return Err(StoreError::InvalidKey {
                key: raw_key.to_string(),
            });
        }
        check_key(&key)?;

        if let Some(k) = expect_key {
            if key != k.trim() {
                return Err(StoreError::KeyMismatch {
                    key: k.trim().to_string(),
                    found: key,
                });
            }
        }
        Ok((key, row))
    }
}
