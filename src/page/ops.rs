//! page/ops — операции над одной страницей.
//!
//! - write: append, если страница не полна (ёмкость проверяется ДО записи).
//! - read: первая строка с совпавшим ключом (trim с обеих сторон).
//! - delete: перезапись без совпавших строк; страница без совпадений не трогается.
//! - update: замена строки; если новая строка той же байтовой ширины —
//!   патч по смещению, иначе перезапись через tmp+rename.
//!
//! Уникальность ключей страница не проверяет — это делает слой бакетов.

use std::fs::OpenOptions;
use std::io::Write;

use log::debug;

use crate::codec::{encode, EncodedRow, Record};
use crate::error::{IoContext, Result};
use crate::metrics::{record_inplace_patch, record_page_rewrite, record_row_appended};

use super::common::{atomic_rewrite, serialize_row, write_at};
use super::Page;

impl Page {
    /// Закодировать и дописать запись. false — страница полна, ничего не изменено.
    pub fn write(&self, record: &Record) -> Result<bool> {
        let row = encode(record, self.schema());
        self.write_row(&row)
    }

    pub fn write_row(&self, row: &EncodedRow) -> Result<bool> {
        if self.is_full()? {
            return Ok(false);
        }
        let bytes = self.row_bytes(row)?;
        let mut f = OpenOptions::new()
            .append(true)
            .open(self.path())
            .at(self.path())?;
        f.write_all(&bytes).at(self.path())?;
        if self.settings.data_fsync {
            f.sync_data().at(self.path())?;
        }
        record_row_appended(bytes.len() as u64);
        Ok(true)
    }

    /// Сериализованная строка (с терминатором) — то, сколько она займёт на диске.
    pub fn row_bytes(&self, row: &EncodedRow) -> Result<Vec<u8>> {
        serialize_row(self.path(), row.values())
    }

    pub fn read(&self, key: &str) -> Result<Option<Record>> {
        Ok(self.find(key)?.map(|r| r.to_record(self.schema())))
    }

    pub fn find(&self, key: &str) -> Result<Option<EncodedRow>> {
        let img = self.load()?;
        let schema = self.schema();
        Ok(img
            .rows
            .into_iter()
            .find(|r| r.row.matches_key(schema, key))
            .map(|r| r.row))
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.find(key)?.is_some())
    }

    /// Все строки страницы в порядке хранения.
    pub fn rows(&self) -> Result<Vec<EncodedRow>> {
        Ok(self.load()?.rows.into_iter().map(|r| r.row).collect())
    }

    /// Количество строк данных (без заголовка).
    pub fn row_count(&self) -> Result<usize> {
        Ok(self.load()?.rows.len())
    }

    /// Удалить все строки с ключом. Возвращает true, если что-то удалено.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let img = self.load()?;
        let hits = img.positions_of(self.schema(), key);
        if hits.is_empty() {
            return Ok(false);
        }
        let out = img.rebuild(|i, _| hits.contains(&i).then_some(None));
        atomic_rewrite(self.path(), &out)?;
        record_page_rewrite();
        debug!(
            "page {}/{}: deleted {} row(s) for key '{}'",
            self.bucket_id(),
            self.page_index(),
            hits.len(),
            key.trim()
        );
        Ok(true)
    }

    pub fn update(&self, key: &str, record: &Record) -> Result<bool> {
        let row = encode(record, self.schema());
        self.update_row(key, &row)
    }

    /// Заменить строку(и) с ключом на `row`, сохранив порядок. true — если замена была.
    pub fn update_row(&self, key: &str, row: &EncodedRow) -> Result<bool> {
        let img = self.load()?;
        let hits = img.positions_of(self.schema(), key);
        if hits.is_empty() {
            return Ok(false);
        }
        let new_bytes = self.row_bytes(row)?;

        // Строка той же ширины — патч на месте, без перезаписи страницы.
        if hits.len() == 1 {
            let span = &img.rows[hits[0]].span;
            if span.len() == new_bytes.len() {
                let mut f = OpenOptions::new()
                    .write(true)
                    .open(self.path())
                    .at(self.path())?;
                write_at(&mut f, span.start as u64, &new_bytes).at(self.path())?;
                if self.settings.data_fsync {
                    f.sync_data().at(self.path())?;
                }
                record_inplace_patch();
                debug!(
                    "page {}/{}: in-place update of key '{}' at offset {}",
                    self.bucket_id(),
                    self.page_index(),
                    key.trim(),
                    span.start
                );
                return Ok(true);
            }
        }

        let out = img.rebuild(|i, _| hits.contains(&i).then(|| Some(new_bytes.clone())));
        atomic_rewrite(self.path(), &out)?;
        record_page_rewrite();
        debug!(
            "page {}/{}: rewrote page updating key '{}'",
            self.bucket_id(),
            self.page_index(),
            key.trim()
        );
        Ok(true)
    }
}
