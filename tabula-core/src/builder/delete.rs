//! DELETE statement builder

use super::common::{IntoCondition, QueryBuilder};
use super::select::SelectBuilder;
use crate::{Error, Result, Value};

/// DELETE builder; refuses to render without a WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBuilder {
    table_name: String,
    filter: SelectBuilder,
}

impl DeleteBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            filter: SelectBuilder::new(table),
        }
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

    /// Add an OR WHERE condition
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

impl QueryBuilder for DeleteBuilder {
    fn to_sql(&self) -> Result<String> {
        match self.filter.where_clause() {
            Some(where_clause) => Ok(format!("DELETE FROM `{}` {}", self.table_name, where_clause)),
            None => Err(Error::invalid_query(
                "DELETE requires at least one condition",
            )),
        }
    }

    fn bindings(&self) -> Vec<Value> {
        self.filter.where_bindings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{delete, op};

    #[test]
    fn test_delete_builder() {
        let query = delete("users")
            .where_(("age", op::LT, 18))
            .or_where(("status", "inactive"));
        assert_eq!(
            query.to_sql().unwrap(),
            "DELETE FROM `users` WHERE `age` < ? OR `status` = ?"
        );
        assert_eq!(
            query.bindings(),
            vec![Value::I32(18), Value::from("inactive")]
        );
    }

    #[test]
    fn test_and_where_joins_with_and() {
        let query = delete("sessions")
            .where_(("user_id", 7))
            .and_where(("expired", true));
        assert_eq!(
            query.to_sql().unwrap(),
            "DELETE FROM `sessions` WHERE `user_id` = ? AND `expired` = ?"
        );
        assert_eq!(query.bindings(), vec![Value::I32(7), Value::Bool(true)]);
    }

    #[test]
    fn test_delete_without_where_fails() {
        let result = delete("users").to_sql();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("DELETE requires at least one condition"));
    }
}
