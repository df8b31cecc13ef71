//! UPDATE statement builder

use super::common::{IntoCondition, IntoFieldValues, QueryBuilder};
use super::select::SelectBuilder;
use crate::{Error, Result, Value};

/// UPDATE builder; the WHERE fragment comes from an inner [`SelectBuilder`]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    table_name: String,
    set_clauses: Vec<(String, Value)>,
    filter: SelectBuilder,
}

impl UpdateBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            set_clauses: Vec::new(),
            filter: SelectBuilder::new(table),
        }
    }

    /// Append `` `col` = ? `` assignments in iteration order
    ///
    /// # Examples
    /// ```
    /// use tabula_core::{update, QueryBuilder, Value};
    ///
    /// let query = update("users")
    ///     .set([("name", Value::from("Jane"))])
    ///     .where_(("id", 5));
    /// assert_eq!(
    ///     query.to_sql().unwrap(),
    ///     "UPDATE `users` SET `name` = ? WHERE `id` = ?"
    /// );
    /// assert_eq!(query.bindings(), vec![Value::from("Jane"), Value::from(5)]);
    /// ```
    pub fn set<T>(mut self, data: T) -> Self
    where
        T: IntoFieldValues,
    {
        self.set_clauses.extend(data.into_field_values());
        self
    }

    /// Add a WHERE condition (AND-joined, see [`SelectBuilder::where_`])
    pub fn where_<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.filter = self.filter.where_(condition);
        self
    }

    /// Add an AND WHERE condition (same as where_)
    pub fn and_where<C>(self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.where_(condition)
    }

    /// Add an OR WHERE condition (see [`SelectBuilder::or_where`])
    pub fn or_where<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.filter = self.filter.or_where(condition);
        self
    }

    /// Replace the filter with the WHERE clause of an existing builder
    pub fn filter(mut self, filter: SelectBuilder) -> Self {
        self.filter = filter;
        self
    }
}

impl QueryBuilder for UpdateBuilder {
    fn to_sql(&self) -> Result<String> {
        if self.set_clauses.is_empty() {
            return Err(Error::invalid_query("UPDATE requires SET clauses"));
        }
        let Some(where_clause) = self.filter.where_clause() else {
            return Err(Error::invalid_query(
                "UPDATE requires at least one condition",
            ));
        };

        let set_parts: Vec<String> = self
            .set_clauses
            .iter()
            .map(|(column, _)| format!("`{column}` = ?"))
            .collect();

        Ok(format!(
            "UPDATE `{}` SET {} {}",
            self.table_name,
            set_parts.join(", "),
            where_clause
        ))
    }

    /// SET values first, then the WHERE bindings
    fn bindings(&self) -> Vec<Value> {
        let mut bindings: Vec<Value> = self
            .set_clauses
            .iter()
            .map(|(_, value)| value.clone())
            .collect();
        bindings.extend(self.filter.where_bindings());
        bindings
    }
}
