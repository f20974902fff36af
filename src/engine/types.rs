//! Native result types returned by a query engine binding.
//!
//! These represent the engine's result before shaping: typed cells, column
//! metadata, and the engine's cost report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The engine-native result of one succeeded job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NativeResult {
    /// Column metadata in result order.
    pub columns: Vec<ColumnInfo>,

    /// Rows of typed cells, aligned positionally with `columns`.
    pub rows: Vec<Row>,

    /// Bytes scanned by the engine to produce this result.
    pub bytes_scanned: u64,
}

impl NativeResult {
    /// Creates a result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            bytes_scanned: 0,
        }
    }

    /// Sets the bytes-scanned cost report.
    pub fn with_bytes_scanned(mut self, bytes_scanned: u64) -> Self {
        self.bytes_scanned = bytes_scanned;
        self
    }

    /// Returns true if the result set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Engine-reported data type.
    #[serde(default, rename = "type")]
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of typed cells.
pub type Row = Vec<Value>;

/// A single engine-native cell value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerces the value to its transport text form.
    ///
    /// NULL becomes the empty string, booleans and numbers their canonical
    /// decimal forms, and binary data lowercase hex. This is the shape cells
    /// take in the response payload.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => b.iter().map(|byte| format!("{byte:02x}")).collect(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

// Conversion implementations for common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
