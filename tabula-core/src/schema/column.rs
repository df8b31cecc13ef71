//! Column and index metadata

use crate::Value;
use serde::{Deserialize, Serialize};

/// Metadata for one table column
///
/// # Examples
/// ```
/// use tabula_core::ColumnMeta;
///
/// let id = ColumnMeta::new("id", "int")
///     .with_primary(true)
///     .with_nullable(false)
///     .with_auto_increment(true);
///
/// assert!(id.is_primary());
/// assert!(!id.is_nullable());
/// assert_eq!(id.sql_type(), "int");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMeta {
    name: String,
    #[serde(rename = "type")]
    sql_type: String,
    is_primary: bool,
    is_nullable: bool,
    default: Option<Value>,
    is_unique: bool,
    is_auto_increment: bool,
    length: Option<u64>,
    comment: Option<String>,
}

impl ColumnMeta {
    /// A nullable, non-key column with no default
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            is_primary: false,
            is_nullable: true,
            default: None,
            is_unique: false,
            is_auto_increment: false,
            length: None,
            comment: None,
        }
    }

    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    pub fn with_nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.set_default(default);
        self
    }

    pub fn with_unique(mut self, is_unique: bool) -> Self {
        self.is_unique = is_unique;
        self
    }

    pub fn with_auto_increment(mut self, is_auto_increment: bool) -> Self {
        self.is_auto_increment = is_auto_increment;
        self
    }

    pub fn with_length(mut self, length: Option<u64>) -> Self {
        self.length = length;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_unique(&self) -> bool {
        self.is_unique
    }

    pub fn is_auto_increment(&self) -> bool {
        self.is_auto_increment
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_sql_type(&mut self, sql_type: impl Into<String>) {
        self.sql_type = sql_type.into();
    }

    pub fn set_primary(&mut self, is_primary: bool) {
        self.is_primary = is_primary;
    }

    pub fn set_nullable(&mut self, is_nullable: bool) {
        self.is_nullable = is_nullable;
    }

    /// Set the default; `Value::Null` clears it
    pub fn set_default(&mut self, default: impl Into<Value>) {
        self.default = match default.into() {
            Value::Null => None,
            value => Some(value),
        };
    }

    pub fn set_unique(&mut self, is_unique: bool) {
        self.is_unique = is_unique;
    }

    pub fn set_auto_increment(&mut self, is_auto_increment: bool) {
        self.is_auto_increment = is_auto_increment;
    }

    pub fn set_length(&mut self, length: Option<u64>) {
        self.length = length;
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }
}

/// An index: its columns in key order and whether it is unique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexMeta {
    pub fn new<I, S>(columns: I, unique: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            unique,
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}
