//! Error types for Tabula

use thiserror::Error;

/// The main error type for Tabula operations
#[derive(Error, Debug)]
pub enum Error {
    /// Statement preparation or execution failed in the driver
    #[error("Statement error: {message}")]
    Statement { message: String },

    /// Could not establish a session with the database
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Catalog query failed while loading a table schema
    #[error("Introspection of table '{table}' failed: {message}")]
    Introspection { table: String, message: String },

    /// A CRUD operation on a table failed
    #[error("{operation} failed: {message}")]
    Operation { operation: String, message: String },

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Invalid connection configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Error reported by the sqlx driver
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type for Tabula operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new statement error carrying the driver's diagnostic text
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new introspection error for `table`
    pub fn introspection(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Introspection {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a new operation error, e.g. `Error::operation("insert", "...")`
    pub fn operation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
