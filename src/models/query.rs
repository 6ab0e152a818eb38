//! Query-related data models.
//!
//! This module defines types for SQL query requests and results.

use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A parameter value for parameterized queries.
///
/// Only scalars are accepted; callers pass `null` to bind a database NULL.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value, bound as the number 1 or 0
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

// Decoded through `JsonValue`: arbitrary-precision numbers never reach untagged variants.
impl<'de> Deserialize<'de> for QueryParam {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match JsonValue::deserialize(deserializer)? {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(b) => Ok(Self::Bool(b)),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(|| de::Error::custom("numeric parameter is out of range")),
            JsonValue::String(s) => Ok(Self::String(s)),
            JsonValue::Array(_) | JsonValue::Object(_) => Err(de::Error::custom(
                "parameter values must be null, a boolean, a number or a string",
            )),
        }
    }
}

/// Input for the `oracle_query` tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct QueryRequest {
    /// A single SELECT statement, or WITH ... SELECT. No semicolons.
    pub sql: String,

    /// Named bind values. A leading ':' on a name is ignored.
    #[serde(default)]
    pub parameters: Option<BTreeMap<String, QueryParam>>,

    /// Maximum rows to return. Clamped to the server's ceiling; values below 1 become 1.
    #[serde(default)]
    pub max_rows: Option<i64>,
}

/// Column metadata as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,

    /// Driver type name. Absent when the driver could not report it.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, type_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            type_name,
        }
    }
}

/// One result row.
///
/// Keys are matched case-insensitively. Serialization keeps column order; when two
/// columns differ only in case the later value wins under the first spelling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, JsonValue)>,
}

fn same_name(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

impl Row {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: JsonValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| same_name(key, &name)) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.entries
            .iter()
            .find(|(key, _)| same_name(key, name))
            .map(|(_, value)| value)
    }

    /// String value of a column, `None` for missing, null or non-string values.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(JsonValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Result of a read-only query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
    /// True when the row count reached the effective cap.
    pub truncated: bool,
}
