//! Schema — упорядоченное описание полей записи.
//!
//! Источник — JSON-документ <root>/schema/schema.json:
//!
//! ```json
//! {
//!   "columns": {
//!     "user_id":  { "type": "int" },
//!     "username": { "type": "text", "length_type": "fixed", "length": 10 }
//!   },
//!   "primary_key": "user_id"
//! }
//! ```
//!
//! Порядок колонок в документе = порядок кодирования (serde_json preserve_order).
//! Схема неизменна после загрузки и разделяется через `Arc`.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::consts::DEFAULT_KEY_FIELD;
use crate::error::{IoContext, Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Text,
}

impl FieldType {
    /// `int`/`integer` — целое, всё остальное — текст.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => FieldType::Integer,
            _ => FieldType::Text,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Integer => write!(f, "int"),
            FieldType::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    /// Some(n) — значение усекается/дополняется пробелами до n символов.
    pub fixed_len: Option<usize>,
}

impl FieldSpec {
    pub fn int<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), ty: FieldType::Integer, fixed_len: None }
    }

    pub fn text<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), ty: FieldType::Text, fixed_len: None }
    }

    pub fn fixed(mut self, len: usize) -> Self {
        self.fixed_len = Some(len);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    key_index: usize,
}

// ---- JSON document ----

#[derive(Deserialize)]
struct SchemaDoc {
    columns: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    primary_key: Option<String>,
}

#[derive(Deserialize)]
struct ColumnDoc {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    length_type: Option<String>,
    #[serde(default)]
    length: Option<usize>,
}

impl Schema {
    /// Построить схему из списка полей; `key_field` обязан присутствовать.
    pub fn new(fields: Vec<FieldSpec>, key_field: &str) -> Result<Self> {
        if fields.is_empty() {
            return Err(StoreError::Schema("schema has no fields".into()));
        }
        let mut seen = HashSet::new();
        for f in &fields {
            if f.name.is_empty() {
                return Err(StoreError::Schema("empty field name".into()));
            }
            if !seen.insert(f.name.as_str()) {
                return Err(StoreError::Schema(format!("duplicate field '{}'", f.name)));
            }
            if f.fixed_len == Some(0) {
                return Err(StoreError::Schema(format!(
                    "field '{}' has fixed length 0",
                    f.name
                )));
            }
        }
        let key_index = fields
            .iter()
            .position(|f| f.name == key_field)
            .ok_or_else(|| {
                StoreError::Schema(format!("key field '{}' is not declared", key_field))
            })?;
        Ok(Self { fields, key_index })
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let doc: SchemaDoc = serde_json::from_str(s)
            .map_err(|e| StoreError::Schema(format!("parse schema document: {}", e)))?;

        let mut fields = Vec::with_capacity(doc.columns.len());
        for (name, v) in doc.columns {
            let col: ColumnDoc = serde_json::from_value(v)
                .map_err(|e| StoreError::Schema(format!("column '{}': {}", name, e)))?;
            let fixed_len = match col.length_type.as_deref() {
                Some("fixed") => Some(col.length.ok_or_else(|| {
                    StoreError::Schema(format!("column '{}': fixed length without 'length'", name))
                })?),
                _ => None,
            };
            fields.push(FieldSpec {
                name,
                ty: FieldType::from_tag(&col.ty),
                fixed_len,
            });
        }

        let key = doc.primary_key.as_deref().unwrap_or(DEFAULT_KEY_FIELD);
        Self::new(fields, key)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).at(path)?;
        Self::from_json_str(&s)
    }

    #[inline]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[inline]
    pub fn key_index(&self) -> usize {
        self.key_index
    }

    #[inline]
    pub fn key_field(&self) -> &str {
        &self.fields[self.key_index].name
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Имена полей в порядке схемы (строка заголовка страницы).
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|fs| match fs.fixed_len {
                Some(n) => format!("{}:{}({})", fs.name, fs.ty, n),
                None => format!("{}:{}", fs.name, fs.ty),
            })
            .collect();
        write!(f, "{{{}}} key={}", parts.join(", "), self.key_field())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "columns": {
            "user_id": {"type": "int"},
            "username": {"type": "text", "length_type": "fixed", "length": 10},
            "email": {"type": "text"},
            "bill": {"type": "int", "length_type": "fixed", "length": 6},
            "date": {"type": "date", "length_type": "fixed", "length": 10}
        }
    }"#;

    #[test]
    fn json_document_keeps_column_order() {
        let s = Schema::from_json_str(DOC).unwrap();
        assert_eq!(
            s.field_names(),
            vec!["user_id", "username", "email", "bill", "date"]
        );
        assert_eq!(s.key_field(), "user_id");
        assert_eq!(s.fields()[1].fixed_len, Some(10));
        assert_eq!(s.fields()[3].ty, FieldType::Integer);
        // неизвестный тег — текст
        assert_eq!(s.fields()[4].ty, FieldType::Text);
    }

    #[test]
    fn explicit_primary_key() {
        let doc = r#"{"columns": {"id": {"type": "integer"}, "v": {"type": "text"}}, "primary_key": "id"}"#;
        let s = Schema::from_json_str(doc).unwrap();
        assert_eq!(s.key_field(), "id");
        assert_eq!(s.key_index(), 0);
    }

    #[test]
    fn rejects_missing_key_and_duplicates() {
        let doc = r#"{"columns": {"id": {"type": "int"}}}"#;
        assert!(matches!(Schema::from_json_str(doc), Err(StoreError::Schema(_))));

        let dup = vec![FieldSpec::int("user_id"), FieldSpec::text("user_id")];
        assert!(matches!(Schema::new(dup, "user_id"), Err(StoreError::Schema(_))));

        let zero = vec![FieldSpec::int("user_id").fixed(0)];
        assert!(Schema::new(zero, "user_id").is_err());
    }
}
