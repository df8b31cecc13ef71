//! Blocking MySQL connection backed by sqlx

use crate::executor::{Connection, PreparedStatement};
use crate::value::BindType;
use crate::{ConnectionConfig, Error, Result, Row, Value};
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection as _, Executor, Row as _, TypeInfo, ValueRef};
use tokio::runtime::{Builder, Runtime};

/// A lazily opened MySQL session.
///
/// Each call drives the async driver to completion on a private
/// current-thread runtime, so it must not be used from inside another
/// tokio runtime.
pub struct MySqlConnection {
    config: ConnectionConfig,
    runtime: Runtime,
    session: Option<sqlx::MySqlConnection>,
    last_insert_id: u64,
}

impl MySqlConnection {
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::connection(format!("Failed to start driver runtime: {e}")))?;

        Ok(Self {
            config,
            runtime,
            session: None,
            last_insert_id: 0,
        })
    }

    /// Build a connection from the `TABULA_DB_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ConnectionConfig::from_env()?)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn connect_options(&self) -> Result<MySqlConnectOptions> {
        Ok(self.config.to_url()?.parse::<MySqlConnectOptions>()?)
    }

    fn run_simple(&mut self, sql: &str) -> Result<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        self.runtime.block_on(session.execute(sql))?;
        Ok(true)
    }
}

impl Connection for MySqlConnection {
    fn connect(&mut self) -> Result<bool> {
        if self.session.is_none() {
            let options = self.connect_options()?;
            let session = self
                .runtime
                .block_on(options.connect())
                .map_err(|e| Error::connection(format!("Connection failed: {e}")))?;
            tracing::debug!(host = %self.config.host, database = %self.config.database, "connected");
            self.session = Some(session);
        }
        Ok(true)
    }

    fn disconnect(&mut self) {
        self.last_insert_id = 0;
        if let Some(session) = self.session.take() {
            if let Err(err) = self.runtime.block_on(session.close()) {
                tracing::warn!(error = %err, "error while closing connection");
            }
        }
    }

    fn is_alive(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => self.runtime.block_on(session.ping()).is_ok(),
            None => false,
        }
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn PreparedStatement + '_>> {
        self.connect()?;
        let Self {
            runtime,
            session,
            last_insert_id,
            ..
        } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| Error::connection("Not connected"))?;

        // Server-side prepare surfaces syntax and unknown-table errors here.
        runtime
            .block_on((&mut *session).prepare(sql))
            .map_err(|e| Error::statement(e.to_string()))?;

        Ok(Box::new(MySqlStatement {
            runtime,
            session,
            last_insert_id,
            sql: sql.to_string(),
            values: Vec::new(),
            rows: Vec::new(),
        }))
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.connect()?;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::connection("Not connected"))?;
        let rows = self.runtime.block_on(session.fetch_all(sql))?;
        rows.iter().map(decode_row).collect()
    }

    fn last_insert_id(&self) -> u64 {
        self.last_insert_id
    }

    fn begin_transaction(&mut self) -> Result<bool> {
        self.run_simple("START TRANSACTION")
    }

    fn commit(&mut self) -> Result<bool> {
        self.run_simple("COMMIT")
    }

    fn rollback(&mut self) -> Result<bool> {
        self.run_simple("ROLLBACK")
    }
}

impl Drop for MySqlConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct MySqlStatement<'a> {
    runtime: &'a Runtime,
    session: &'a mut sqlx::MySqlConnection,
    last_insert_id: &'a mut u64,
    sql: String,
    values: Vec<Value>,
    rows: Vec<MySqlRow>,
}

impl PreparedStatement for MySqlStatement<'_> {
    fn bind(&mut self, types: &[BindType], values: &[Value]) -> Result<()> {
        if types.len() != values.len() {
            return Err(Error::statement(format!(
                "Expected {} bind types, got {}",
                values.len(),
                types.len()
            )));
        }
        self.values = values.to_vec();
        Ok(())
    }

    fn execute(&mut self) -> Result<u64> {
        let query = bind_values(sqlx::query(&self.sql), &self.values);

        if returns_rows(&self.sql) {
            self.rows = self.runtime.block_on(query.fetch_all(&mut *self.session))?;
            return Ok(self.rows.len() as u64);
        }

        let result = self.runtime.block_on(query.execute(&mut *self.session))?;
        Ok(record_outcome(
            self.last_insert_id,
            result.rows_affected(),
            result.last_insert_id(),
        ))
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        std::mem::take(&mut self.rows).iter().map(decode_row).collect()
    }

    fn close(self: Box<Self>) {}
}

/// Every write replaces the remembered id, so a statement that generated
/// none reports 0 instead of an earlier insert's id
fn record_outcome(last_insert_id: &mut u64, rows_affected: u64, insert_id: u64) -> u64 {
    *last_insert_id = insert_id;
    rows_affected
}

/// Statements whose results are read with `fetch_all` instead of `execute`
fn returns_rows(sql: &str) -> bool {
    let head = sql.split_whitespace().next().unwrap_or_default();
    ["SELECT", "SHOW", "DESCRIBE", "EXPLAIN", "WITH"]
        .iter()
        .any(|keyword| head.eq_ignore_ascii_case(keyword))
}

fn bind_values<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &'q [Value],
) -> Query<'q, MySql, MySqlArguments> {
    for value in values {
        query = match value {
            Value::Null => query.bind(None::<Vec<u8>>),
            Value::Bool(b) => query.bind(*b),
            Value::I32(i) => query.bind(*i),
            Value::I64(i) => query.bind(*i),
            Value::F32(f) => query.bind(*f),
            Value::F64(f) => query.bind(*f),
            Value::String(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
            Value::Json(j) => query.bind(j.to_string()),
        };
    }
    query
}

fn decode_row(row: &MySqlRow) -> Result<Row> {
    let mut decoded = Row::with_capacity(row.len());
    for column in row.columns() {
        let index = column.ordinal();
        let value = decode_column(row, index, column.type_info().name())?;
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOLEAN" => Value::Bool(row.try_get(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Value::I64(row.try_get(index)?),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => {
            let n: u64 = row.try_get(index)?;
            Value::I64(i64::try_from(n).unwrap_or(i64::MAX))
        }
        "FLOAT" => Value::F32(row.try_get(index)?),
        "DOUBLE" => Value::F64(row.try_get(index)?),
        "JSON" => Value::Json(row.try_get(index)?),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            Value::Bytes(row.try_get(index)?)
        }
        #[cfg(feature = "datetime-support")]
        "DATETIME" | "TIMESTAMP" => {
            let at: chrono::NaiveDateTime = row.try_get(index)?;
            Value::from(at)
        }
        #[cfg(feature = "datetime-support")]
        "DATE" => {
            let day: chrono::NaiveDate = row.try_get(index)?;
            Value::from(day)
        }
        #[cfg(feature = "decimal-support")]
        "DECIMAL" => {
            let n: rust_decimal::Decimal = row.try_get(index)?;
            Value::from(n)
        }
        _ => match row.try_get::<String, _>(index) {
            Ok(s) => Value::String(s),
            Err(_) => Value::Bytes(row.try_get_unchecked(index)?),
        },
    };
    Ok(value)
}
