//! Schema-aware table access

use super::column::{ColumnMeta, IndexMeta};
use super::introspect;
use super::registry::Registry;
use crate::builder::{IntoColumns, IntoFieldValues, SortDirection};
use crate::executor::{execute_statement, fetch_rows, Connection, ConnectionGuard, Execution};
use crate::{
    DeleteBuilder, Error, InsertBuilder, QueryBuilder, Result, Row, SelectBuilder, UpdateBuilder,
    Value,
};
use serde::Serialize;

/// Default page size for [`TableSchema::select`]
pub const DEFAULT_SELECT_LIMIT: u64 = 20;

/// Parameters of [`TableSchema::select`].
///
/// Conditions are equality filters applied in order. A key starting with
/// `"OR "` (any case) is joined with `OR` on the remaining column name;
/// every other key is joined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOptions {
    pub columns: Vec<String>,
    pub conditions: Vec<(String, Value)>,
    pub limit: u64,
    pub offset: u64,
    pub order_by: Vec<(String, SortDirection)>,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            conditions: Vec::new(),
            limit: DEFAULT_SELECT_LIMIT,
            offset: 0,
            order_by: Vec::new(),
        }
    }
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns<T: IntoColumns>(mut self, columns: T) -> Self {
        self.columns = columns.into_columns();
        self
    }

    /// Add an equality filter; prefix the column with `"OR "` to OR-join it
    pub fn condition(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions<T: IntoFieldValues>(mut self, conditions: T) -> Self {
        self.conditions.extend(conditions.into_field_values());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: impl Into<SortDirection>) -> Self {
        self.order_by.push((column.into(), direction.into()));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    fn to_query(&self, table: &str) -> SelectBuilder {
        let mut query = if self.columns.is_empty() {
            SelectBuilder::new(table)
        } else {
            SelectBuilder::new(table).select(self.columns.clone())
        };

        for (key, value) in &self.conditions {
            query = match or_column(key) {
                Some(column) => query.or_where((column, value.clone())),
                None => query.where_((key.as_str(), value.clone())),
            };
        }
        for (column, direction) in &self.order_by {
            query = query.order_by(column, *direction);
        }

        query.limit(self.limit).offset(self.offset)
    }
}

fn or_column(key: &str) -> Option<&str> {
    key.get(..3)
        .filter(|prefix| prefix.eq_ignore_ascii_case("OR "))
        .map(|_| &key[3..])
}

/// Metadata and CRUD access for one database table.
///
/// [`TableSchema::load`] reads the table comment, columns and indexes from
/// `information_schema`; the registries then change only through the
/// explicit mutators or [`TableSchema::reload`]. CRUD methods log failures
/// and return a sentinel; the `try_*` variants return the error instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
    name: String,
    columns: Registry<ColumnMeta>,
    indexes: Registry<IndexMeta>,
    comment: Option<String>,
}

impl TableSchema {
    /// An empty schema that has not touched the database
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Registry::new(),
            indexes: Registry::new(),
            comment: None,
        }
    }

    /// Load a table's structure from the catalog.
    ///
    /// Never fails: a connection or catalog error is logged and the schema
    /// keeps whatever was read before it. A table missing from the catalog
    /// yields empty registries and no comment.
    pub fn load<C>(name: impl Into<String>, conn: &mut C) -> Self
    where
        C: Connection + ?Sized,
    {
        let mut schema = Self::new(name);
        schema.load_structure(conn);
        schema
    }

    /// Drop the cached structure and read it again
    pub fn reload<C>(&mut self, conn: &mut C)
    where
        C: Connection + ?Sized,
    {
        self.columns.clear();
        self.indexes.clear();
        self.comment = None;
        self.load_structure(conn);
    }

    fn load_structure<C>(&mut self, conn: &mut C)
    where
        C: Connection + ?Sized,
    {
        match self.try_load_structure(conn) {
            Ok(()) => tracing::debug!(
                table = %self.name,
                columns = self.columns.len(),
                indexes = self.indexes.len(),
                "loaded table structure"
            ),
            Err(err) => tracing::warn!(
                table = %self.name,
                error = %err,
                "failed to load table structure"
            ),
        }
    }

    fn try_load_structure<C>(&mut self, conn: &mut C) -> Result<()>
    where
        C: Connection + ?Sized,
    {
        let table = self.name.clone();
        let catalog = |err: Error| match err {
            err @ Error::Introspection { .. } => err,
            other => Error::introspection(&table, other.to_string()),
        };

        let mut conn = ConnectionGuard::acquire(conn).map_err(catalog)?;

        let rows = run_select(&mut *conn, &introspect::comment_query(&table)).map_err(catalog)?;
        if let Some(row) = rows.first() {
            self.comment = introspect::decode_comment(row);
        }

        let rows = run_select(&mut *conn, &introspect::columns_query(&table)).map_err(catalog)?;
        for row in &rows {
            self.add_column(introspect::decode_column(&table, row)?);
        }

        let rows = run_select(&mut *conn, &introspect::statistics_query(&table)).map_err(catalog)?;
        for (name, index) in introspect::decode_indexes(&table, &rows)? {
            self.indexes.insert(name, index);
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub fn columns(&self) -> &Registry<ColumnMeta> {
        &self.columns
    }

    pub fn indexes(&self) -> &Registry<IndexMeta> {
        &self.indexes
    }

    /// Register a column under its own name, replacing any column of that name
    pub fn add_column(&mut self, column: ColumnMeta) {
        self.columns.insert(column.name().to_string(), column);
    }

    pub fn remove_column(&mut self, name: &str) -> bool {
        self.columns.remove(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn add_index<I, S>(&mut self, name: impl Into<String>, columns: I, unique: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes.insert(name, IndexMeta::new(columns, unique));
    }

    pub fn remove_index(&mut self, name: &str) -> bool {
        self.indexes.remove(name).is_some()
    }

    pub fn index(&self, name: &str) -> Option<&IndexMeta> {
        self.indexes.get(name)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains(name)
    }

    /// First column flagged as primary key
    pub fn primary_key(&self) -> Option<&ColumnMeta> {
        self.columns.values().find(|column| column.is_primary())
    }

    pub fn unique_columns(&self) -> Vec<&ColumnMeta> {
        self.columns.values().filter(|column| column.is_unique()).collect()
    }

    pub fn auto_increment_column(&self) -> Option<&ColumnMeta> {
        self.columns.values().find(|column| column.is_auto_increment())
    }

    /// Insert one row and return the generated id, `None` on failure
    pub fn insert<C, T>(&self, conn: &mut C, data: T) -> Option<u64>
    where
        C: Connection + ?Sized,
        T: IntoFieldValues,
    {
        self.log_failure("insert", self.try_insert(conn, data)).ok()
    }

    pub fn try_insert<C, T>(&self, conn: &mut C, data: T) -> Result<u64>
    where
        C: Connection + ?Sized,
        T: IntoFieldValues,
    {
        let query = InsertBuilder::new(&self.name).values(data);
        let execution = self.run_modification(conn, &query, "insert")?;
        Ok(execution.last_insert_id)
    }

    /// Fetch rows, an empty vec on failure
    pub fn select<C>(&self, conn: &mut C, options: &SelectOptions) -> Vec<Row>
    where
        C: Connection + ?Sized,
    {
        self.log_failure("select", self.try_select(conn, options))
            .unwrap_or_default()
    }

    pub fn try_select<C>(&self, conn: &mut C, options: &SelectOptions) -> Result<Vec<Row>>
    where
        C: Connection + ?Sized,
    {
        let query = options.to_query(&self.name);
        let mut conn = ConnectionGuard::acquire(conn).map_err(operation_failed("select"))?;
        run_select(&mut *conn, &query).map_err(operation_failed("select"))
    }

    /// Update the rows matching every condition; `false` on failure
    ///
    /// # Examples
    /// ```no_run
    /// # fn demo(conn: &mut dyn tabula_core::Connection) {
    /// use tabula_core::{TableSchema, Value};
    ///
    /// let users = TableSchema::load("users", conn);
    /// let updated = users.update(conn, [("x", Value::from(1))], [("id", Value::from(5))]);
    /// # let _ = updated;
    /// # }
    /// ```
    pub fn update<C, D, W>(&self, conn: &mut C, data: D, conditions: W) -> bool
    where
        C: Connection + ?Sized,
        D: IntoFieldValues,
        W: IntoFieldValues,
    {
        self.log_failure("update", self.try_update(conn, data, conditions))
            .is_ok()
    }

    pub fn try_update<C, D, W>(&self, conn: &mut C, data: D, conditions: W) -> Result<u64>
    where
        C: Connection + ?Sized,
        D: IntoFieldValues,
        W: IntoFieldValues,
    {
        let mut query = UpdateBuilder::new(&self.name).set(data);
        for (column, value) in conditions.into_field_values() {
            query = query.where_((column.as_str(), value));
        }
        let execution = self.run_modification(conn, &query, "update")?;
        Ok(execution.rows_affected)
    }

    /// Delete the rows matching every condition; `false` on failure
    pub fn delete<C, W>(&self, conn: &mut C, conditions: W) -> bool
    where
        C: Connection + ?Sized,
        W: IntoFieldValues,
    {
        self.log_failure("delete", self.try_delete(conn, conditions))
            .is_ok()
    }

    pub fn try_delete<C, W>(&self, conn: &mut C, conditions: W) -> Result<u64>
    where
        C: Connection + ?Sized,
        W: IntoFieldValues,
    {
        let mut query = DeleteBuilder::new(&self.name);
        for (column, value) in conditions.into_field_values() {
            query = query.where_((column.as_str(), value));
        }
        let execution = self.run_modification(conn, &query, "delete")?;
        Ok(execution.rows_affected)
    }

    /// Pretty-printed JSON snapshot of name, columns, indexes and comment
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn run_modification<C, Q>(
        &self,
        conn: &mut C,
        query: &Q,
        operation: &'static str,
    ) -> Result<Execution>
    where
        C: Connection + ?Sized,
        Q: QueryBuilder,
    {
        let sql = query.to_sql().map_err(operation_failed(operation))?;
        let bindings = query.bindings();
        let mut conn = ConnectionGuard::acquire(conn).map_err(operation_failed(operation))?;
        execute_statement(&mut *conn, &sql, &bindings).map_err(operation_failed(operation))
    }

    fn log_failure<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::error!(table = %self.name, operation, error = %err, "table operation failed");
        }
        result
    }
}

fn run_select<C>(conn: &mut C, query: &SelectBuilder) -> Result<Vec<Row>>
where
    C: Connection + ?Sized,
{
    fetch_rows(conn, &query.to_sql()?, &query.bindings())
}

fn operation_failed(operation: &'static str) -> impl Fn(Error) -> Error {
    move |err| Error::operation(operation, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConnection;

    fn catalog_row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn users_catalog() -> MockConnection {
        MockConnection::new()
            .with_rows(
                "information_schema.tables",
                vec![catalog_row(&[("table_comment", Value::from("Registered users"))])],
            )
            .with_rows(
                "information_schema.columns",
                vec![
                    catalog_row(&[
                        ("COLUMN_NAME", Value::from("id")),
                        ("DATA_TYPE", Value::from("int")),
                        ("COLUMN_KEY", Value::from("PRI")),
                        ("IS_NULLABLE", Value::from("NO")),
                        ("COLUMN_DEFAULT", Value::Null),
                        ("EXTRA", Value::from("auto_increment")),
                        ("COLUMN_COMMENT", Value::from("")),
                        ("CHARACTER_MAXIMUM_LENGTH", Value::Null),
                    ]),
                    catalog_row(&[
                        ("COLUMN_NAME", Value::from("email")),
                        ("DATA_TYPE", Value::from("varchar")),
                        ("COLUMN_KEY", Value::from("UNI")),
                        ("IS_NULLABLE", Value::from("NO")),
                        ("COLUMN_DEFAULT", Value::Null),
                        ("EXTRA", Value::from("")),
                        ("COLUMN_COMMENT", Value::from("login address")),
                        ("CHARACTER_MAXIMUM_LENGTH", Value::I64(191)),
                    ]),
                ],
            )
            .with_rows(
                "information_schema.statistics",
                vec![
                    catalog_row(&[
                        ("INDEX_NAME", Value::from("PRIMARY")),
                        ("COLUMN_NAME", Value::from("id")),
                        ("NON_UNIQUE", Value::I64(0)),
                    ]),
                    catalog_row(&[
                        ("INDEX_NAME", Value::from("uniq_email")),
                        ("COLUMN_NAME", Value::from("email")),
                        ("NON_UNIQUE", Value::I64(0)),
                    ]),
                ],
            )
    }

    #[test]
    fn test_load_reads_catalog() {
        let mut conn = users_catalog();
        let users = TableSchema::load("users", &mut conn);

        assert_eq!(users.name(), "users");
        assert_eq!(users.comment(), Some("Registered users"));
        assert_eq!(users.columns().names().collect::<Vec<_>>(), ["id", "email"]);
        assert_eq!(users.primary_key().map(ColumnMeta::name), Some("id"));
        assert_eq!(users.auto_increment_column().map(ColumnMeta::name), Some("id"));
        assert_eq!(users.unique_columns().len(), 1);
        assert_eq!(users.column("email").and_then(ColumnMeta::length), Some(191));
        assert!(users.index("uniq_email").unwrap().unique);

        // one scope for all three catalog queries
        assert_eq!(conn.connects, 1);
        assert_eq!(conn.disconnects, 1);
        assert_eq!(conn.executed.len(), 3);
        for statement in &conn.executed {
            assert!(statement.sql.contains("= DATABASE() AND"));
            assert_eq!(statement.values, vec![Value::from("users")]);
            assert_eq!(statement.types, "s");
        }
    }

    #[test]
    fn test_load_missing_table_is_empty() {
        let mut conn = MockConnection::new();
        let ghost = TableSchema::load("ghost", &mut conn);

        assert!(ghost.columns().is_empty());
        assert!(ghost.indexes().is_empty());
        assert_eq!(ghost.comment(), None);
        assert_eq!(conn.disconnects, 1);
    }

    #[test]
    fn test_load_keeps_partial_structure_on_failure() {
        let mut conn = users_catalog().failing_execute("information_schema.statistics", "gone away");
        let users = TableSchema::load("users", &mut conn);

        assert_eq!(users.columns().len(), 2);
        assert!(users.indexes().is_empty());
        assert_eq!(conn.disconnects, 1);
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_load_without_connection_is_empty() {
        let mut conn = MockConnection::new().refusing_connections();
        let users = TableSchema::load("users", &mut conn);
        assert!(users.columns().is_empty());
        assert!(conn.executed.is_empty());
    }

    #[test]
    fn test_reload_resyncs() {
        let mut users = TableSchema::new("users");
        users.add_column(ColumnMeta::new("stale", "text"));
        users.set_comment(Some("old".to_string()));

        let mut conn = users_catalog();
        users.reload(&mut conn);

        assert!(!users.has_column("stale"));
        assert!(users.has_column("email"));
        assert_eq!(users.comment(), Some("Registered users"));
    }

    #[test]
    fn test_registry_mutators() {
        let mut table = TableSchema::new("posts");
        table.add_column(ColumnMeta::new("id", "int").with_primary(true));
        table.add_column(ColumnMeta::new("slug", "varchar").with_unique(true));
        table.add_index("idx_slug", ["slug"], true);

        assert!(table.has_column("slug"));
        assert!(table.remove_column("slug"));
        assert!(!table.remove_column("slug"));
        assert!(table.has_index("idx_slug"));
        assert!(table.remove_index("idx_slug"));
        assert!(!table.has_index("idx_slug"));
        assert_eq!(table.auto_increment_column(), None);

        table.set_name("articles");
        assert_eq!(table.name(), "articles");
    }

    #[test]
    fn test_insert_returns_generated_id() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new().with_insert_id(7);

        let id = users.insert(
            &mut conn,
            [("name", Value::from("Ada")), ("score", Value::from(9.5))],
        );

        assert_eq!(id, Some(7));
        assert_eq!(
            conn.executed[0].sql,
            "INSERT INTO `users` (`name`, `score`) VALUES (?, ?)"
        );
        assert_eq!(conn.executed[0].types, "sd");
        assert_eq!(conn.disconnects, 1);
    }

    #[test]
    fn test_insert_failure_returns_none() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new().failing_execute("INSERT", "Duplicate entry");

        assert_eq!(users.insert(&mut conn, [("email", "a@b.c")]), None);
        assert_eq!(conn.disconnects, 1);

        let err = users.try_insert(&mut conn, [("email", "a@b.c")]).unwrap_err();
        assert!(matches!(err, Error::Operation { .. }));
        assert!(err.to_string().contains("Duplicate entry"));
    }

    #[test]
    fn test_insert_without_data_returns_none() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new();
        assert_eq!(users.insert(&mut conn, Vec::<(String, Value)>::new()), None);
        assert_eq!(conn.connects, 0);
    }

    #[test]
    fn test_select_builds_query_from_options() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new().with_rows(
            "FROM users",
            vec![catalog_row(&[("id", Value::I64(1))])],
        );

        let options = SelectOptions::new()
            .columns(("id", "name"))
            .condition("status", "active")
            .condition("or role", "admin")
            .order_by("name", "desc");
        let rows = users.select(&mut conn, &options);

        assert_eq!(rows.len(), 1);
        assert_eq!(
            conn.executed[0].sql,
            "SELECT id, name FROM users WHERE `status` = ? OR `role` = ? ORDER BY `name` DESC LIMIT ?"
        );
        assert_eq!(
            conn.executed[0].values,
            vec![Value::from("active"), Value::from("admin"), Value::from(20u64)]
        );
    }

    #[test]
    fn test_select_defaults_and_offset() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new();

        users.select(&mut conn, &SelectOptions::new().limit(5).offset(10));
        assert_eq!(
            conn.executed[0].sql,
            "SELECT * FROM users LIMIT ? OFFSET ?"
        );
        assert_eq!(
            conn.executed[0].values,
            vec![Value::from(5u64), Value::from(10u64)]
        );
    }

    #[test]
    fn test_select_failure_returns_empty() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new().failing_prepare("FROM users", "no such table");

        assert!(users.select(&mut conn, &SelectOptions::new()).is_empty());
        assert_eq!(conn.disconnects, 1);
    }

    #[test]
    fn test_update_binds_data_then_conditions() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new();

        assert!(users.update(&mut conn, [("x", 1)], [("id", 5)]));

        let statement = &conn.executed[0];
        assert_eq!(statement.sql, "UPDATE `users` SET `x` = ? WHERE `id` = ?");
        assert_eq!(statement.values, vec![Value::I32(1), Value::I32(5)]);
        assert_eq!(statement.types, "ii");
        assert_eq!(conn.disconnects, 1);
    }

    #[test]
    fn test_update_failure_returns_false() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new().failing_prepare("UPDATE", "syntax error");
        assert!(!users.update(&mut conn, [("x", 1)], [("id", 5)]));
        assert_eq!(conn.disconnects, 1);
    }

    #[test]
    fn test_update_without_conditions_is_refused() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new();
        assert!(!users.update(&mut conn, [("x", 1)], Vec::<(String, Value)>::new()));
        assert!(conn.executed.is_empty());
    }

    #[test]
    fn test_delete() {
        let users = TableSchema::new("users");
        let mut conn = MockConnection::new();

        assert!(users.delete(&mut conn, [("id", 3), ("tenant", 9)]));
        assert_eq!(
            conn.executed[0].sql,
            "DELETE FROM `users` WHERE `id` = ? AND `tenant` = ?"
        );
        assert_eq!(conn.executed[0].values, vec![Value::I32(3), Value::I32(9)]);

        let mut failing = MockConnection::new().failing_execute("DELETE", "lock wait timeout");
        assert!(!users.delete(&mut failing, [("id", 3)]));
        assert_eq!(failing.disconnects, 1);
    }

    #[test]
    fn test_to_json_snapshot() {
        let mut conn = users_catalog();
        let users = TableSchema::load("users", &mut conn);

        let json: serde_json::Value = serde_json::from_str(&users.to_json().unwrap()).unwrap();
        assert_eq!(json["name"], "users");
        assert_eq!(json["comment"], "Registered users");
        assert_eq!(json["columns"]["id"]["isPrimary"], true);
        assert_eq!(json["columns"]["email"]["length"], 191);
        assert_eq!(json["indexes"]["PRIMARY"]["columns"][0], "id");
    }
}
