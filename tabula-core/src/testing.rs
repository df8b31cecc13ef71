//! In-memory connection double for unit tests

use crate::executor::{Connection, PreparedStatement};
use crate::value::BindType;
use crate::{Error, Result, Row, Value};

/// A statement the mock executed, with what was bound to it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExecutedStatement {
    pub sql: String,
    pub types: String,
    pub values: Vec<Value>,
}

/// Scripted connection: rows and failures are keyed by a substring of the SQL
#[derive(Debug, Default)]
pub(crate) struct MockConnection {
    connected: bool,
    refuse_connections: bool,
    pub connects: usize,
    pub disconnects: usize,
    pub prepared: Vec<String>,
    pub executed: Vec<ExecutedStatement>,
    rows: Vec<(String, Vec<Row>)>,
    prepare_failures: Vec<(String, String)>,
    execute_failures: Vec<(String, String)>,
    next_insert_id: u64,
    last_insert_id: u64,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            next_insert_id: 1,
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, needle: &str, rows: Vec<Row>) -> Self {
        self.rows.push((needle.to_string(), rows));
        self
    }

    pub fn failing_prepare(mut self, needle: &str, message: &str) -> Self {
        self.prepare_failures
            .push((needle.to_string(), message.to_string()));
        self
    }

    pub fn failing_execute(mut self, needle: &str, message: &str) -> Self {
        self.execute_failures
            .push((needle.to_string(), message.to_string()));
        self
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    pub fn with_insert_id(mut self, id: u64) -> Self {
        self.next_insert_id = id;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn lookup<'a, T>(entries: &'a [(String, T)], sql: &str) -> Option<&'a T> {
        entries
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, value)| value)
    }
}

impl Connection for MockConnection {
    fn connect(&mut self) -> Result<bool> {
        if self.refuse_connections {
            return Err(Error::connection("Connection refused"));
        }
        if !self.connected {
            self.connected = true;
            self.connects += 1;
        }
        Ok(true)
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.connected = false;
    }

    fn is_alive(&mut self) -> bool {
        self.connected
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn PreparedStatement + '_>> {
        self.connect()?;
        self.prepared.push(sql.to_string());
        if let Some(message) = Self::lookup(&self.prepare_failures, sql) {
            return Err(Error::statement(message.clone()));
        }
        Ok(Box::new(MockStatement {
            conn: self,
            sql: sql.to_string(),
            types: Vec::new(),
            values: Vec::new(),
            rows: Vec::new(),
        }))
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.connect()?;
        Ok(Self::lookup(&self.rows, sql).cloned().unwrap_or_default())
    }

    fn last_insert_id(&self) -> u64 {
        self.last_insert_id
    }

    fn begin_transaction(&mut self) -> Result<bool> {
        Ok(self.connected)
    }

    fn commit(&mut self) -> Result<bool> {
        Ok(self.connected)
    }

    fn rollback(&mut self) -> Result<bool> {
        Ok(self.connected)
    }
}

struct MockStatement<'a> {
    conn: &'a mut MockConnection,
    sql: String,
    types: Vec<BindType>,
    values: Vec<Value>,
    rows: Vec<Row>,
}

impl PreparedStatement for MockStatement<'_> {
    fn bind(&mut self, types: &[BindType], values: &[Value]) -> Result<()> {
        if types.len() != values.len() {
            return Err(Error::statement("Number of types does not match values"));
        }
        self.types = types.to_vec();
        self.values = values.to_vec();
        Ok(())
    }

    fn execute(&mut self) -> Result<u64> {
        self.conn.executed.push(ExecutedStatement {
            sql: self.sql.clone(),
            types: BindType::type_string(&self.types),
            values: self.values.clone(),
        });

        if let Some(message) = MockConnection::lookup(&self.conn.execute_failures, &self.sql) {
            return Err(Error::statement(message.clone()));
        }

        if self.sql.starts_with("SELECT") {
            self.rows = MockConnection::lookup(&self.conn.rows, &self.sql)
                .cloned()
                .unwrap_or_default();
            return Ok(self.rows.len() as u64);
        }

        if self.sql.starts_with("INSERT") {
            self.conn.last_insert_id = self.conn.next_insert_id;
            self.conn.next_insert_id += 1;
        }
        Ok(1)
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        Ok(std::mem::take(&mut self.rows))
    }

    fn close(self: Box<Self>) {}
}
