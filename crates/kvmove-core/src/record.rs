use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Field mapping of one secret. Keys are unique and kept in a stable order.
pub type Fields = BTreeMap<String, FieldValue>;

/// A dynamically typed payload value.
///
/// The payload schema belongs to whoever wrote the secret, so every variant
/// has to survive a migration untouched; only the designated field is ever
/// rewritten, and only when it holds a non-empty string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<FieldValue>),
    Mapping(Fields),
}

impl FieldValue {
    /// The string payload, if this is a string with at least one byte.
    pub fn as_non_empty_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => {
                FieldValue::Sequence(items.into_iter().map(FieldValue::from).collect())
            }
            Value::Object(map) => FieldValue::Mapping(fields_from_map(map)),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Number(n) => Value::Number(n),
            FieldValue::String(s) => Value::String(s),
            FieldValue::Sequence(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            FieldValue::Mapping(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

/// Convert a JSON object into a field mapping.
pub fn fields_from_map(map: Map<String, Value>) -> Fields {
    map.into_iter()
        .map(|(k, v)| (k, FieldValue::from(v)))
        .collect()
}

/// One leaf secret: its path within the namespace and its field mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretRecord {
    pub path: String,
    #[serde(rename = "data")]
    pub fields: Fields,
}

impl SecretRecord {
    pub fn new(path: impl Into<String>, fields: Fields) -> Self {
        Self {
            path: path.into(),
            fields,
        }
    }
}
