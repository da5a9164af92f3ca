//! page/common — имена файлов страниц, CSV-диалект строк, атомарная перезапись.
//!
//! Диалект совпадает с тем, что пишет csv.DictWriter по умолчанию:
//! разделитель ',', кавычки только при необходимости ('"' удваивается),
//! терминатор "\r\n". Файлы существующих хранилищ читаются и пишутся байт-в-байт.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::consts::{FIELD_DELIMITER, PAGE_FILE_EXT, TMP_SUFFIX};
use crate::error::{IoContext, Result, StoreError};

/// `<table>_<bucket>.csv` для page_index == 0, `<table>_<bucket>_<index>.csv` иначе.
pub fn page_file_name(table: &str, bucket: u32, page_index: u32) -> String {
    if page_index == 0 {
        format!("{}_{}.{}", table, bucket, PAGE_FILE_EXT)
    } else {
        format!("{}_{}_{}.{}", table, bucket, page_index, PAGE_FILE_EXT)
    }
}

pub fn page_path(root: &Path, table: &str, bucket: u32, page_index: u32) -> PathBuf {
    root.join(page_file_name(table, bucket, page_index))
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}", name, TMP_SUFFIX))
}

/// Сериализовать одну CSV-строку (с терминатором).
pub fn serialize_row<I, S>(path: &Path, values: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut w = csv::WriterBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .has_headers(false)
        .from_writer(Vec::new());
    w.write_record(values)
        .map_err(|e| StoreError::format(path, e))?;
    w.into_inner()
        .map_err(|e| {
            let src = e.error();
            StoreError::io(path, std::io::Error::new(src.kind(), src.to_string()))
        })
}

pub(crate) fn csv_reader(buf: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .has_headers(true)
        .flexible(false)
        .from_reader(buf)
}

/// Перезапись страницы: tmp + fsync + rename (+ fsync каталога best-effort).
/// Либо старое, либо новое содержимое — усечённой страницы после сбоя не бывает.
pub(crate) fn atomic_rewrite(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    let _ = std::fs::remove_file(&tmp);

    let mut tf = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)
        .at(&tmp)?;
    tf.write_all(bytes).at(&tmp)?;
    tf.sync_all().at(&tmp)?;
    drop(tf);

    std::fs::rename(&tmp, path).at(path)?;
    let _ = fsync_parent_dir(path);
    Ok(())
}

pub(crate) fn write_at(f: &mut File, offset: u64, buf: &[u8]) -> std::io::Result<()> {
    f.seek(SeekFrom::Start(offset))?;
    f.write_all(buf)
}

// Best-effort fsync parent directory after rename (Unix only).
#[cfg(unix)]
pub(crate) fn fsync_parent_dir(p: &Path) -> std::io::Result<()> {
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}
#[cfg(not(unix))]
pub(crate) fn fsync_parent_dir(_p: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_bucket_layout() {
        assert_eq!(page_file_name("db", 3, 0), "db_3.csv");
        assert_eq!(page_file_name("db", 3, 1), "db_3_1.csv");
        assert_eq!(page_file_name("users", 12, 7), "users_12_7.csv");
    }

    #[test]
    fn rows_use_minimal_quoting_and_crlf() {
        let p = Path::new("x.csv");
        assert_eq!(serialize_row(p, ["5", "alice     "]).unwrap(), b"5,alice     \r\n");
        assert_eq!(
            serialize_row(p, ["1", "a,b", "say \"hi\""]).unwrap(),
            b"1,\"a,b\",\"say \"\"hi\"\"\"\r\n".to_vec()
        );
    }
}
