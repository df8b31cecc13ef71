//! Tabula Core - an immutable SQL statement builder with schema-aware tables
//!
//! Statements are built by chaining calls on owned values, rendered with
//! positional `?` placeholders, and executed on any [`Connection`].
//! [`TableSchema`] loads a table's columns and indexes from
//! `information_schema` and runs parameterized CRUD against it.

pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod operator;
pub mod schema;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export main types
pub use builder::{
    Condition, Connective, DeleteBuilder, InsertBuilder, JoinType, QueryBuilder, SelectBuilder,
    SortDirection, UpdateBuilder, WhereToken,
};
pub use config::ConnectionConfig;
pub use error::{Error, Result};
pub use executor::{
    Connection, ConnectionGuard, ExecutableModification, ExecutableQuery, Execution,
    PreparedStatement,
};
#[cfg(feature = "mysql")]
pub use mysql::MySqlConnection;
pub use operator::{op, IntoOperator, Operator};
pub use schema::{ColumnMeta, IndexMeta, SelectOptions, TableSchema};
pub use value::{BindType, Row, Value, CURRENT_DATABASE};

/// Start a SELECT on `table`
pub fn from(table: &str) -> SelectBuilder {
    SelectBuilder::new(table)
}

/// Start an INSERT into `table`
pub fn insert(table: &str) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Start an UPDATE of `table`
pub fn update(table: &str) -> UpdateBuilder {
    UpdateBuilder::new(table)
}

/// Start a DELETE from `table`
pub fn delete(table: &str) -> DeleteBuilder {
    DeleteBuilder::new(table)
}
