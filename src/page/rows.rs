//! page/rows — разбор файла страницы в образ: заголовок + строки с байтовыми границами.
//!
//! Границы строк нужны, чтобы delete/update копировали нетронутые строки
//! байт-в-байт и чтобы update равной ширины патчил строку по смещению.

use std::ops::Range;
use std::path::Path;

use crate::codec::EncodedRow;
use crate::error::{Result, StoreError};
use crate::schema::Schema;

use super::common::csv_reader;

#[derive(Debug, Clone)]
pub struct StoredRow {
    pub row: EncodedRow,
    /// Байтовый диапазон строки в файле, включая терминатор.
    pub span: Range<usize>,
}

#[derive(Debug)]
pub struct PageImage {
    pub bytes: Vec<u8>,
    /// Конец заголовка = начало первой строки данных.
    pub header_end: usize,
    pub rows: Vec<StoredRow>,
}

/// csv отдаёт позицию записи сразу после '\r' предыдущей строки, т.е. на '\n'
/// терминатора (или на пустой строке). Строка данных начинается после них.
fn skip_line_breaks(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && (bytes[pos] == b'\r' || bytes[pos] == b'\n') {
        pos += 1;
    }
    pos
}

impl PageImage {
    pub fn parse(path: &Path, bytes: Vec<u8>, schema: &Schema) -> Result<Self> {
        let mut starts: Vec<usize> = Vec::new();
        let mut values: Vec<Vec<String>> = Vec::new();
        let header: Vec<String>;
        {
            let mut rdr = csv_reader(&bytes);
            header = rdr
                .headers()
                .map_err(|e| StoreError::format(path, e))?
                .iter()
                .map(|s| s.to_string())
                .collect();

            let mut rec = csv::StringRecord::new();
            loop {
                let more = rdr
                    .read_record(&mut rec)
                    .map_err(|e| StoreError::format(path, e))?;
                if !more {
                    break;
                }
                let start = rec.position().map(|p| p.byte() as usize).unwrap_or(0);
                starts.push(skip_line_breaks(&bytes, start));
                values.push(rec.iter().map(|s| s.to_string()).collect());
            }
        }

        let expected = schema.field_names();
        if header != expected {
            return Err(StoreError::HeaderMismatch {
                path: path.to_path_buf(),
                expected,
                found: header,
            });
        }

        let header_end = starts.first().copied().unwrap_or(bytes.len());
        let mut rows = Vec::with_capacity(values.len());
        for (i, v) in values.into_iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(bytes.len());
            rows.push(StoredRow {
                row: EncodedRow::from_stored(v),
                span: starts[i]..end,
            });
        }

        Ok(Self {
            bytes,
            header_end,
            rows,
        })
    }

    /// Индексы строк с данным ключом (ключи уникальны — обычно не более одного).
    pub fn positions_of(&self, schema: &Schema, key: &str) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.row.matches_key(schema, key))
            .map(|(i, _)| i)
            .collect()
    }

    /// Собрать новый файл: заголовок как есть + строки, каждую либо копией
    /// исходных байтов, либо заменой из `replace`; `None` из replace — строка удаляется.
    pub fn rebuild<F>(&self, mut replace: F) -> Vec<u8>
    where
        F: FnMut(usize, &StoredRow) -> Option<Option<Vec<u8>>>,
    {
        let mut out = Vec::with_capacity(self.bytes.len());
        out.extend_from_slice(&self.bytes[..self.header_end]);
        for (i, r) in self.rows.iter().enumerate() {
            match replace(i, r) {
                // строка не тронута
                None => out.extend_from_slice(&self.bytes[r.span.clone()]),
                Some(Some(new_bytes)) => out.extend_from_slice(&new_bytes),
                Some(None) => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    fn schema() -> Schema {
        Schema::new(
            vec![FieldSpec::int("user_id"), FieldSpec::text("username").fixed(10)],
            "user_id",
        )
        .unwrap()
    }

    #[test]
    fn spans_start_after_line_terminator() {
        let bytes = b"user_id,username\r\n1,a         \r\n2,\"b,c\"     \r\n".to_vec();
        let img = PageImage::parse(Path::new("db_0.csv"), bytes.clone(), &schema()).unwrap();
        assert_eq!(&bytes[..img.header_end], b"user_id,username\r\n");
        assert_eq!(img.rows.len(), 2);
        assert_eq!(&bytes[img.rows[0].span.clone()], b"1,a         \r\n");
        assert_eq!(&bytes[img.rows[1].span.clone()], b"2,\"b,c\"     \r\n");
    }

    #[test]
    fn rebuild_keeps_terminators() {
        let bytes = b"user_id,username\r\n1,a         \r\n2,b         \r\n".to_vec();
        let img = PageImage::parse(Path::new("db_0.csv"), bytes, &schema()).unwrap();

        let only_first = img.rebuild(|i, _| (i == 1).then_some(None));
        assert_eq!(only_first, b"user_id,username\r\n1,a         \r\n");

        let none = img.rebuild(|_, _| Some(None));
        assert_eq!(none, b"user_id,username\r\n");
    }

    #[test]
    fn empty_page_has_header_only() {
        let bytes = b"user_id,username\r\n".to_vec();
        let img = PageImage::parse(Path::new("db_0.csv"), bytes, &schema()).unwrap();
        assert!(img.rows.is_empty());
        assert_eq!(img.header_end, 18);
    }
}
