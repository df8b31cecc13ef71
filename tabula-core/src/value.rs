//! Value types for SQL parameters and result rows

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Literal marker rendered inline instead of being bound as a parameter.
///
/// A condition whose value is exactly this string renders as
/// `` `col` = DATABASE() `` and contributes no binding.
pub const CURRENT_DATABASE: &str = "DATABASE()";

/// One fetched row, keyed by column label
pub type Row = HashMap<String, Value>;

/// A SQL value that can be used as a parameter or read back from a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// JSON value
    Json(serde_json::Value),
}

/// Driver-level bind tag derived per bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindType {
    Integer,
    Float,
    Text,
    Binary,
}

impl BindType {
    /// Derive the bind tag for a value.
    ///
    /// Integers and booleans bind as integers, floats as doubles, strings and
    /// JSON documents as text. Everything else (bytes, NULL) binds as binary.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) | Value::I32(_) | Value::I64(_) => BindType::Integer,
            Value::F32(_) | Value::F64(_) => BindType::Float,
            Value::String(_) | Value::Json(_) => BindType::Text,
            Value::Bytes(_) | Value::Null => BindType::Binary,
        }
    }

    /// The single-character tag used by mysqli-style drivers
    pub fn as_char(&self) -> char {
        match self {
            BindType::Integer => 'i',
            BindType::Float => 'd',
            BindType::Text => 's',
            BindType::Binary => 'b',
        }
    }

    /// Derive the tags for a whole binding list, in order
    pub fn for_values(values: &[Value]) -> Vec<BindType> {
        values.iter().map(BindType::of).collect()
    }

    /// Render a tag list as a type string such as `"isd"`
    pub fn type_string(types: &[BindType]) -> String {
        types.iter().map(BindType::as_char).collect()
    }
}

impl Value {
    /// The `DATABASE()` literal marker as a value
    pub fn current_database() -> Self {
        Value::String(CURRENT_DATABASE.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is the inline `DATABASE()` marker
    pub fn is_literal_marker(&self) -> bool {
        matches!(self, Value::String(s) if s == CURRENT_DATABASE)
    }

    /// Whether this value is sent to the driver as a bound parameter
    pub fn is_bindable(&self) -> bool {
        !self.is_null() && !self.is_literal_marker()
    }

    pub fn bind_type(&self) -> BindType {
        BindType::of(self)
    }

    /// Get the MySQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INT",
            Value::I64(_) => "BIGINT",
            Value::F32(_) => "FLOAT",
            Value::F64(_) => "DOUBLE",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
            Value::Json(_) => "JSON",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value; numeric strings are parsed, since catalog
    /// views report some flags as text on older servers
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::I32(i) => Some(i64::from(*i)),
            Value::I64(i) => Some(*i),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I32(i) => Some(f64::from(*i)),
            Value::I64(i) => Some(*i as f64),
            Value::F32(f) => Some(f64::from(*f)),
            Value::F64(f) => Some(*f),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Render the value as an inline SQL literal.
    ///
    /// Only meant for logs and debugging; strings get minimal backslash
    /// escaping and are not safe against injection.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Value::I32(i) => i.to_string(),
            Value::I64(i) => i.to_string(),
            Value::F32(f) => f.to_string(),
            Value::F64(f) => f.to_string(),
            Value::String(s) => quote(s),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Value::Json(j) => quote(&j.to_string()),
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            other => f.write_str(&other.to_sql_literal()),
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::I64(i64::from(val))
    }
}

/// Values above `i64::MAX` saturate to `i64::MAX`
impl From<u64> for Value {
    fn from(val: u64) -> Self {
        Value::I64(i64::try_from(val).unwrap_or(i64::MAX))
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::String(val.hyphenated().to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDate> for Value {
    fn from(val: chrono::NaiveDate) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::String(val.to_string())
    }
}
