//! Connection contract and statement execution

use crate::value::BindType;
use crate::{Error, QueryBuilder, Result, Row, SelectBuilder, Value};
use std::ops::{Deref, DerefMut};

/// A database session the builders and tables run statements on.
///
/// Implementations connect lazily: `connect` and `disconnect` are both
/// idempotent, and `disconnect` must be safe to call when not connected.
pub trait Connection {
    /// Open the session if it is not open yet
    fn connect(&mut self) -> Result<bool>;

    /// Close the session; a no-op when already closed
    fn disconnect(&mut self);

    /// Whether the underlying session is alive
    fn is_alive(&mut self) -> bool;

    /// Prepare a statement with `?` placeholders
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn PreparedStatement + '_>>;

    /// Run unparameterized SQL and fetch its rows
    fn query(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// Id generated by the last successful INSERT on this session
    fn last_insert_id(&self) -> u64;

    fn begin_transaction(&mut self) -> Result<bool>;

    fn commit(&mut self) -> Result<bool>;

    fn rollback(&mut self) -> Result<bool>;
}

/// A prepared statement bound to the connection that produced it
pub trait PreparedStatement {
    /// Bind `values` to the placeholders, one tag per value
    fn bind(&mut self, types: &[BindType], values: &[Value]) -> Result<()>;

    /// Execute, returning the number of affected rows
    fn execute(&mut self) -> Result<u64>;

    /// Rows produced by the last `execute`
    fn fetch_all(&mut self) -> Result<Vec<Row>>;

    /// Release the statement
    fn close(self: Box<Self>);
}

/// Scoped connection: connects on acquire, disconnects when dropped.
///
/// Every exit path out of the scope (success, `?` propagation, panic
/// unwinding) releases the connection exactly once.
pub struct ConnectionGuard<'a, C: Connection + ?Sized> {
    conn: &'a mut C,
}

impl<'a, C: Connection + ?Sized> ConnectionGuard<'a, C> {
    pub fn acquire(conn: &'a mut C) -> Result<Self> {
        conn.connect()?;
        Ok(Self { conn })
    }
}

impl<C: Connection + ?Sized> Deref for ConnectionGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.conn
    }
}

impl<C: Connection + ?Sized> DerefMut for ConnectionGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.conn
    }
}

impl<C: Connection + ?Sized> Drop for ConnectionGuard<'_, C> {
    fn drop(&mut self) {
        self.conn.disconnect();
    }
}

/// Outcome of a modification statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Execution {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

fn prepare_failed(err: Error) -> Error {
    match err {
        Error::Statement { message } => {
            Error::statement(format!("Failed to prepare statement: {message}"))
        }
        other => Error::statement(format!("Failed to prepare statement: {other}")),
    }
}

fn prepare_and_bind<'c, C: Connection + ?Sized>(
    conn: &'c mut C,
    sql: &str,
    bindings: &[Value],
) -> Result<Box<dyn PreparedStatement + 'c>> {
    tracing::debug!(sql = %sql, bindings = bindings.len(), "executing statement");

    let mut stmt = conn.prepare(sql).map_err(prepare_failed)?;
    if !bindings.is_empty() {
        let types = BindType::for_values(bindings);
        stmt.bind(&types, bindings)?;
    }
    Ok(stmt)
}

/// Run a row-returning statement on an already acquired connection
pub(crate) fn fetch_rows<C: Connection + ?Sized>(
    conn: &mut C,
    sql: &str,
    bindings: &[Value],
) -> Result<Vec<Row>> {
    let mut stmt = prepare_and_bind(conn, sql, bindings)?;
    stmt.execute()?;
    let rows = stmt.fetch_all()?;
    stmt.close();
    Ok(rows)
}

/// Run a modification statement on an already acquired connection
pub(crate) fn execute_statement<C: Connection + ?Sized>(
    conn: &mut C,
    sql: &str,
    bindings: &[Value],
) -> Result<Execution> {
    let rows_affected = {
        let mut stmt = prepare_and_bind(conn, sql, bindings)?;
        let rows_affected = stmt.execute()?;
        stmt.close();
        rows_affected
    };

    Ok(Execution {
        rows_affected,
        last_insert_id: conn.last_insert_id(),
    })
}

/// Extension trait for builders that return rows
pub trait ExecutableQuery: QueryBuilder {
    /// Connect, run the statement, fetch every row and disconnect.
    ///
    /// The connection is released on every path; a prepare failure surfaces
    /// as [`Error::Statement`] with the driver's message.
    fn fetch_all<C>(&self, conn: &mut C) -> Result<Vec<Row>>
    where
        C: Connection + ?Sized,
    {
        let sql = self.to_sql()?;
        let bindings = self.bindings();
        let mut conn = ConnectionGuard::acquire(conn)?;
        fetch_rows(&mut *conn, &sql, &bindings)
    }
}

impl ExecutableQuery for SelectBuilder {}

/// Extension trait for modification builders (INSERT, UPDATE, DELETE)
pub trait ExecutableModification: QueryBuilder {
    /// Connect, run the statement and disconnect
    fn execute<C>(&self, conn: &mut C) -> Result<Execution>
    where
        C: Connection + ?Sized,
    {
        let sql = self.to_sql()?;
        let bindings = self.bindings();
        let mut conn = ConnectionGuard::acquire(conn)?;
        execute_statement(&mut *conn, &sql, &bindings)
    }
}

impl ExecutableModification for crate::InsertBuilder {}
impl ExecutableModification for crate::UpdateBuilder {}
impl ExecutableModification for crate::DeleteBuilder {}
