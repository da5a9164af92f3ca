//! codec — запись (поле → значение) ↔ строка фиксированного формата.
//!
//! Политика кодирования — тихая коэрция, а не валидация:
//! - отсутствующее поле → пустая строка;
//! - целое поле → остаются только ASCII-цифры;
//! - поле фиксированной длины → усечение до n символов + дополнение пробелами.
//!
//! `encode` — чистая тотальная функция, не делает I/O и не падает.

use std::collections::BTreeMap;

use crate::consts::PAD_CHAR;
use crate::error::{Result, StoreError};
use crate::schema::{FieldType, Schema};

/// Запись на границе приложения.
pub type Record = BTreeMap<String, String>;

/// Закодированная строка: значения в порядке полей схемы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRow {
    values: Vec<String>,
}

impl EncodedRow {
    /// Строка из уже закодированных значений (как они лежат в странице).
    pub fn from_stored(values: Vec<String>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[inline]
    pub fn key<'a>(&'a self, schema: &Schema) -> &'a str {
        self.values
            .get(schema.key_index())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Ключ строки совпадает с запрошенным (обе стороны trim).
    #[inline]
    pub fn matches_key(&self, schema: &Schema, key: &str) -> bool {
        self.key(schema).trim() == key.trim()
    }

    /// Запись в хранимом (нормализованном, с паддингом) виде.
    pub fn to_record(&self, schema: &Schema) -> Record {
        schema
            .fields()
            .iter()
            .zip(self.values.iter())
            .map(|(f, v)| (f.name.clone(), v.clone()))
            .collect()
    }
}

fn encode_value(raw: &str, ty: FieldType, fixed_len: Option<usize>) -> String {
    let mut v: String = match ty {
        FieldType::Integer => raw.chars().filter(|c| c.is_ascii_digit()).collect(),
        FieldType::Text => raw.to_string(),
    };
    if let Some(n) = fixed_len {
        let len = v.chars().count();
        if len > n {
            v = v.chars().take(n).collect();
        } else {
            v.extend(std::iter::repeat(PAD_CHAR).take(n - len));
        }
    }
    v
}

pub fn encode(record: &Record, schema: &Schema) -> EncodedRow {
    let values = schema
        .fields()
        .iter()
        .map(|f| {
            let raw = record.get(&f.name).map(|s| s.as_str()).unwrap_or("");
            encode_value(raw, f.ty, f.fixed_len)
        })
        .collect();
    EncodedRow { values }
}

/// Обратное преобразование: у полей фиксированной длины срезается хвостовой паддинг.
pub fn decode(row: &EncodedRow, schema: &Schema) -> Record {
    schema
        .fields()
        .iter()
        .zip(row.values.iter())
        .map(|(f, v)| {
            let v = if f.fixed_len.is_some() {
                v.trim_end_matches(PAD_CHAR).to_string()
            } else {
                v.clone()
            };
            (f.name.clone(), v)
        })
        .collect()
}

/// Нормализованная форма записи — то, что вернёт read() после write().
pub fn normalize(record: &Record, schema: &Schema) -> Record {
    encode(record, schema).to_record(schema)
}

/// Strict-режим: каждое поле схемы должно присутствовать в записи.
pub fn check_fields(record: &Record, schema: &Schema) -> Result<()> {
    for f in schema.fields() {
        if !record.contains_key(&f.name) {
            return Err(StoreError::SchemaFieldMissing { field: f.name.clone() });
        }
    }
    Ok(())
}

/// JSON-объект → Record. Числа/bool приводятся к строке, null — пустая строка.
pub fn record_from_json(v: &serde_json::Value) -> Result<Record> {
    let obj = v
        .as_object()
        .ok_or_else(|| StoreError::Schema("record must be a JSON object".into()))?;
    let mut rec = Record::new();
    for (k, val) in obj {
        let s = match val {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            other => {
                return Err(StoreError::Schema(format!(
                    "field '{}': nested value {} is not supported",
                    k, other
                )))
            }
        };
        rec.insert(k.clone(), s);
    }
    Ok(rec)
}

/// Record → JSON-объект в порядке полей схемы (для CLI вывода).
pub fn record_to_json(rec: &Record, schema: &Schema) -> serde_json::Value {
    let mut m = serde_json::Map::new();
    for f in schema.fields() {
        if let Some(v) = rec.get(&f.name) {
            m.insert(f.name.clone(), serde_json::Value::String(v.clone()));
        }
    }
    serde_json::Value::Object(m)
}
