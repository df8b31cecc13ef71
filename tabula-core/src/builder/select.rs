//! SELECT statement builder

use super::common::{
    Condition, Connective, IntoColumns, IntoCondition, JoinClause, JoinType, OrderByClause,
    QueryBuilder, SortDirection, WhereToken,
};
use crate::{IntoOperator, Operator, Result, Value};

/// Immutable SELECT builder.
///
/// Every method takes the builder by value and returns a new one, so a
/// builder kept in a binding is never changed by chaining on a clone of it.
///
/// # Examples
/// ```
/// use tabula_core::{from, QueryBuilder, Value};
///
/// let query = from("users")
///     .select(("id", "name"))
///     .where_(("status", "active"))
///     .order_by("name", "desc")
///     .limit(10);
///
/// assert_eq!(
///     query.to_sql().unwrap(),
///     "SELECT id, name FROM users WHERE `status` = ? ORDER BY `name` DESC LIMIT ?"
/// );
/// assert_eq!(query.bindings(), vec![Value::from("active"), Value::from(10u64)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SelectBuilder {
    table_name: String,
    selected_columns: Vec<String>,
    where_tokens: Vec<WhereToken>,
    join_clauses: Vec<JoinClause>,
    order_by_clauses: Vec<OrderByClause>,
    limit_value: Option<u64>,
    offset_value: u64,
    last_condition: Option<Condition>,
}

impl SelectBuilder {
    /// Create a new SELECT builder projecting `*`
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            selected_columns: vec!["*".to_string()],
            where_tokens: Vec::new(),
            join_clauses: Vec::new(),
            order_by_clauses: Vec::new(),
            limit_value: None,
            offset_value: 0,
            last_condition: None,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn where_tokens(&self) -> &[WhereToken] {
        &self.where_tokens
    }

    /// Replace the projection
    pub fn select<T>(mut self, columns: T) -> Self
    where
        T: IntoColumns,
    {
        self.selected_columns = columns.into_columns();
        self
    }

    /// Select all columns (equivalent to SELECT *)
    pub fn select_all(self) -> Self {
        self.select("*")
    }

    /// Add a WHERE condition, joined with `AND` to the previous `where_`
    ///
    /// # Examples
    /// ```
    /// use tabula_core::{from, op, QueryBuilder};
    ///
    /// let query = from("users")
    ///     .where_(("age", op::GT, 18))
    ///     .where_(("name", "John"));
    /// assert_eq!(
    ///     query.to_sql().unwrap(),
    ///     "SELECT * FROM users WHERE `age` > ? AND `name` = ?"
    /// );
    /// ```
    pub fn where_<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        let condition = condition.into_condition();

        // The connective depends only on earlier where_ calls, not on
        // or_where/where_null.
        if self.last_condition.is_some() {
            self.where_tokens.push(WhereToken::Connective(Connective::And));
        }
        self.where_tokens.push(WhereToken::Condition(condition.clone()));
        self.last_condition = Some(condition);

        self
    }

    /// Add an AND WHERE condition (same as where_)
    pub fn and_where<C>(self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.where_(condition)
    }

    /// Add an OR WHERE condition.
    ///
    /// `OR` is always emitted, even when this is the first condition.
    pub fn or_where<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.where_tokens.push(WhereToken::Connective(Connective::Or));
        self.where_tokens
            .push(WhereToken::Condition(condition.into_condition()));
        self
    }

    /// Add `` `column` IS NULL `` without any connective
    pub fn where_null(mut self, column: &str) -> Self {
        self.where_tokens.push(WhereToken::Condition(Condition::new(
            column,
            Operator::IS,
            Value::Null,
        )));
        self
    }

    /// Add `` `column` IS NOT NULL `` without any connective
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.where_tokens.push(WhereToken::Condition(Condition::new(
            column,
            Operator::IS_NOT,
            Value::Null,
        )));
        self
    }

    /// Add an INNER JOIN clause
    pub fn join<O>(self, table: &str, left: &str, operator: O, right: &str) -> Self
    where
        O: IntoOperator,
    {
        self.push_join(JoinType::Inner, table, left, operator.into_operator(), right)
    }

    /// Add an INNER JOIN clause (same as join)
    pub fn inner_join<O>(self, table: &str, left: &str, operator: O, right: &str) -> Self
    where
        O: IntoOperator,
    {
        self.join(table, left, operator, right)
    }

    /// Add a LEFT JOIN clause
    pub fn left_join<O>(self, table: &str, left: &str, operator: O, right: &str) -> Self
    where
        O: IntoOperator,
    {
        self.push_join(JoinType::Left, table, left, operator.into_operator(), right)
    }

    /// Add a RIGHT JOIN clause
    pub fn right_join<O>(self, table: &str, left: &str, operator: O, right: &str) -> Self
    where
        O: IntoOperator,
    {
        self.push_join(JoinType::Right, table, left, operator.into_operator(), right)
    }

    fn push_join(
        mut self,
        join_type: JoinType,
        table: &str,
        left: &str,
        operator: Operator,
        right: &str,
    ) -> Self {
        self.join_clauses.push(JoinClause {
            join_type,
            table: table.to_string(),
            left: left.to_string(),
            operator,
            right: right.to_string(),
        });
        self
    }

    /// Add an ORDER BY clause; string directions are case-insensitive
    pub fn order_by<D>(mut self, column: &str, direction: D) -> Self
    where
        D: Into<SortDirection>,
    {
        self.order_by_clauses.push(OrderByClause {
            column: column.to_string(),
            direction: direction.into(),
        });
        self
    }

    /// Add an ORDER BY ASC clause (convenience method)
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    /// Add an ORDER BY DESC clause (convenience method)
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    /// Set the LIMIT clause
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_value = Some(limit);
        self
    }

    /// Set the OFFSET clause; zero omits it
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_value = offset;
        self
    }

    /// The `WHERE ...` fragment on its own, if any condition was added
    pub fn where_clause(&self) -> Option<String> {
        if self.where_tokens.is_empty() {
            return None;
        }

        let tokens: Vec<String> = self.where_tokens.iter().map(WhereToken::to_sql).collect();
        Some(format!("WHERE {}", tokens.join(" ")))
    }

    /// Values bound by the WHERE clause alone, in token order
    pub fn where_bindings(&self) -> Vec<Value> {
        self.where_tokens
            .iter()
            .filter_map(|token| match token {
                WhereToken::Condition(condition) if condition.value.is_bindable() => {
                    Some(condition.value.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Log the SQL text and its bindings at debug level
    pub fn debug(&self) {
        tracing::debug!(
            sql = %self.render(),
            bindings = ?self.bindings(),
            "select statement"
        );
    }

    fn render(&self) -> String {
        let mut sql = String::new();

        // SELECT ... FROM
        sql.push_str("SELECT ");
        sql.push_str(&self.selected_columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.table_name);

        for join in &self.join_clauses {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        if let Some(where_clause) = self.where_clause() {
            sql.push(' ');
            sql.push_str(&where_clause);
        }

        if !self.order_by_clauses.is_empty() {
            let parts: Vec<String> = self
                .order_by_clauses
                .iter()
                .map(OrderByClause::to_sql)
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }

        if self.limit_value.is_some() {
            sql.push_str(" LIMIT ?");
        }

        if self.offset_value > 0 {
            sql.push_str(" OFFSET ?");
        }

        sql
    }
}

impl QueryBuilder for SelectBuilder {
    fn to_sql(&self) -> Result<String> {
        Ok(self.render())
    }

    fn bindings(&self) -> Vec<Value> {
        let mut bindings = self.where_bindings();
        if let Some(limit) = self.limit_value {
            bindings.push(limit.into());
        }
        if self.offset_value > 0 {
            bindings.push(self.offset_value.into());
        }
        bindings
    }
}
