//! db/scan — полный скан, flush и статистика.
//!
//! Порядок обхода: бакеты 0..N, внутри — страницы 0..k, внутри — строки в
//! порядке хранения. Строки бакета снимаются целиком под разделяемым lock,
//! так что скан видит каждый бакет согласованным (но не снимок всего
//! хранилища). Колбэк вызывается после освобождения lock и может мутировать
//! хранилище; изменения в ещё не обойдённых бакетах скан увидит.

use std::fs::OpenOptions;

use serde::Serialize;

use crate::codec::Record;
use crate::error::{IoContext, Result, StoreError};

use super::core::Store;

/// Параметры скана: фильтр по полной записи и проекция на подмножество полей.
#[derive(Default)]
pub struct ScanOptions<'a> {
    pub filter: Option<&'a dyn Fn(&Record) -> bool>,
    pub projection: Option<&'a [&'a str]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageStats {
    pub page_index: u32,
    pub bytes: u64,
    pub rows: usize,
    pub full: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketStats {
    pub bucket: u32,
    pub pages: Vec<PageStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub buckets: Vec<BucketStats>,
    pub total_pages: usize,
    pub total_rows: usize,
    pub total_bytes: u64,
}

impl Store {
    /// Потоковый скан: cb(ключ, запись) для каждой подходящей записи;
    /// cb возвращает false, чтобы остановить обход.
    pub fn scan<F>(&self, opts: &ScanOptions<'_>, mut cb: F) -> Result<()>
    where
        F: FnMut(&str, &Record) -> bool,
    {
        let schema = self.schema();
        if let Some(fields) = opts.projection {
            for f in fields {
                if schema.index_of(f).is_none() {
                    return Err(StoreError::Schema(format!("unknown field '{}' in projection", f)));
                }
            }
        }

        for lock in self.dir.buckets() {
            // снимок бакета; колбэк — уже без lock
            let rows = {
                let bucket = lock.read();
                let mut rows = Vec::new();
                for page in bucket.pages() {
                    rows.extend(page.rows()?);
                }
                rows
            };
            for row in rows {
                let rec = row.to_record(schema);
                if let Some(pred) = opts.filter {
                    if !pred(&rec) {
                        continue;
                    }
                }
                let key = row.key(schema).trim();
                let keep_going = match opts.projection {
                    Some(fields) => {
                        let projected: Record = rec
                            .into_iter()
                            .filter(|(k, _)| fields.contains(&k.as_str()))
                            .collect();
                        cb(key, &projected)
                    }
                    None => cb(key, &rec),
                };
                if !keep_going {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Собрать результат скана в вектор.
    pub fn scan_all(&self, opts: &ScanOptions<'_>) -> Result<Vec<Record>> {
        let mut out = Vec::new();
        self.scan(opts, |_, r| {
            out.push(r.clone());
            true
        })?;
        Ok(out)
    }

    /// fsync всех файлов страниц. В read-only режиме — no-op.
    pub fn flush(&self) -> Result<()> {
        if self.readonly {
            return Ok(());
        }
        for lock in self.dir.buckets() {
            let bucket = lock.read();
            for page in bucket.pages() {
                let f = OpenOptions::new()
                    .write(true)
                    .open(page.path())
                    .at(page.path())?;
                f.sync_all().at(page.path())?;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let mut buckets = Vec::with_capacity(self.bucket_count() as usize);
        let (mut total_pages, mut total_rows, mut total_bytes) = (0usize, 0usize, 0u64);
        for lock in self.dir.buckets() {
            let bucket = lock.read();
            let mut pages = Vec::with_capacity(bucket.page_count());
            for page in bucket.pages() {
                let bytes = page.size()?;
                let rows = page.row_count()?;
                total_pages += 1;
                total_rows += rows;
                total_bytes += bytes;
                pages.push(PageStats {
                    page_index: page.page_index(),
                    bytes,
                    rows,
                    full: bytes >= page.max_size(),
                });
            }
            buckets.push(BucketStats {
                bucket: bucket.id(),
                pages,
            });
        }
        Ok(StoreStats {
            buckets,
            total_pages,
            total_rows,
            total_bytes,
        })
    }
}
