//! INSERT statement builder

use super::common::{IntoFieldValues, QueryBuilder};
use crate::{Error, Result, Value};

/// Single-row INSERT builder
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBuilder {
    table_name: String,
    columns: Vec<String>,
    values: Vec<Value>,
}

impl InsertBuilder {
    /// Create a new INSERT builder with no values yet
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Set the column values of the inserted row, replacing earlier ones
    ///
    /// # Examples
    /// ```
    /// use tabula_core::{insert, QueryBuilder, Value};
    ///
    /// let query = insert("users").values([
    ///     ("name", Value::from("John")),
    ///     ("age", Value::from(30)),
    /// ]);
    /// assert_eq!(
    ///     query.to_sql().unwrap(),
    ///     "INSERT INTO `users` (`name`, `age`) VALUES (?, ?)"
    /// );
    /// ```
    pub fn values<T>(mut self, data: T) -> Self
    where
        T: IntoFieldValues,
    {
        let (columns, values) = data.into_field_values().into_iter().unzip();
        self.columns = columns;
        self.values = values;
        self
    }
}

impl QueryBuilder for InsertBuilder {
    fn to_sql(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(Error::invalid_query("INSERT requires at least one value"));
        }

        let columns: Vec<String> = self.columns.iter().map(|c| format!("`{c}`")).collect();
        let placeholders = vec!["?"; self.values.len()];

        Ok(format!(
            "INSERT INTO `{}` ({}) VALUES ({})",
            self.table_name,
            columns.join(", "),
            placeholders.join(", ")
        ))
    }

    /// Every value is bound, NULL included
    fn bindings(&self) -> Vec<Value> {
        self.values.clone()
    }
}
