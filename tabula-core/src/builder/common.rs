//! Common types and traits shared across all statement builders

use crate::{IntoOperator, Operator, Result, Value};
use std::fmt;

/// Core trait for all statement builders
pub trait QueryBuilder {
    /// Generate the SQL text with `?` placeholders
    fn to_sql(&self) -> Result<String>;

    /// The values bound to the placeholders, in textual order
    fn bindings(&self) -> Vec<Value>;

    /// Render the statement with every binding inlined as a literal.
    ///
    /// Debugging aid only: never execute the returned text.
    fn to_raw_sql(&self) -> Result<String> {
        let mut sql = self.to_sql()?;
        let mut cursor = 0;
        for binding in self.bindings() {
            let Some(pos) = sql[cursor..].find('?') else {
                break;
            };
            let literal = binding.to_sql_literal();
            let at = cursor + pos;
            sql.replace_range(at..at + 1, &literal);
            cursor = at + literal.len();
        }
        Ok(sql)
    }
}

/// Trait for conditions that can be used in WHERE clauses
pub trait IntoCondition {
    fn into_condition(self) -> Condition;
}

// Shorthand equality: where_(("age", 18))
impl<T> IntoCondition for (&str, T)
where
    T: Into<Value>,
{
    fn into_condition(self) -> Condition {
        Condition::new(self.0, Operator::EQ, self.1)
    }
}

// Explicit operators: where_(("age", op::GT, 18)) or where_(("age", ">", 18))
impl<T, O> IntoCondition for (&str, O, T)
where
    T: Into<Value>,
    O: IntoOperator,
{
    fn into_condition(self) -> Condition {
        Condition::new(self.0, self.1.into_operator(), self.2)
    }
}

impl IntoCondition for Condition {
    fn into_condition(self) -> Condition {
        self
    }
}

/// A single comparison in a WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Render as `` `col` op ? `` (or inline `NULL` / `DATABASE()`)
    pub fn to_sql(&self) -> String {
        let rendered = if self.value.is_null() {
            "NULL"
        } else if self.value.is_literal_marker() {
            crate::value::CURRENT_DATABASE
        } else {
            "?"
        };
        format!("`{}` {} {}", self.column, self.operator, rendered)
    }
}

/// Bare connective joining two conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connective::And => write!(f, "AND"),
            Connective::Or => write!(f, "OR"),
        }
    }
}

/// One element of a WHERE clause, rendered exactly in stored order
#[derive(Debug, Clone, PartialEq)]
pub enum WhereToken {
    Condition(Condition),
    Connective(Connective),
}

impl WhereToken {
    pub fn to_sql(&self) -> String {
        match self {
            WhereToken::Condition(condition) => condition.to_sql(),
            WhereToken::Connective(connective) => connective.to_string(),
        }
    }
}

/// Trait to convert various types into columns
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for &[&str] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

// For tuples
impl IntoColumns for (&str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![
            self.0.to_string(),
            self.1.to_string(),
            self.2.to_string(),
            self.3.to_string(),
        ]
    }
}

/// Trait for ordered `column -> value` data (INSERT values, UPDATE sets,
/// equality filters). Order of iteration is the order of placeholders.
pub trait IntoFieldValues {
    fn into_field_values(self) -> Vec<(String, Value)>;
}

impl<I, K, V> IntoFieldValues for I
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fn into_field_values(self) -> Vec<(String, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

/// JOIN types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
        }
    }
}

/// A JOIN clause: `<KIND> JOIN `table` ON left op right`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub left: String,
    pub operator: Operator,
    pub right: String,
}

impl JoinClause {
    pub fn to_sql(&self) -> String {
        format!(
            "{} JOIN `{}` ON {} {} {}",
            self.join_type, self.table, self.left, self.operator, self.right
        )
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Case-insensitive: `"desc"` sorts descending, anything else ascending
impl From<&str> for SortDirection {
    fn from(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

impl From<String> for SortDirection {
    fn from(direction: String) -> Self {
        SortDirection::from(direction.as_str())
    }
}

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderByClause {
    pub fn to_sql(&self) -> String {
        format!("`{}` {}", self.column, self.direction)
    }
}
