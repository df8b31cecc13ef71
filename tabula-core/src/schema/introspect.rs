//! Catalog queries against `information_schema` and row decoding

use super::column::{ColumnMeta, IndexMeta};
use crate::{Error, Result, Row, SelectBuilder, Value, CURRENT_DATABASE};

/// `table_comment` of one table in the current database
pub(crate) fn comment_query(table: &str) -> SelectBuilder {
    SelectBuilder::new("information_schema.tables")
        .select("table_comment")
        .where_(("table_schema", CURRENT_DATABASE))
        .where_(("table_name", table))
}

/// Column definitions in ordinal order
pub(crate) fn columns_query(table: &str) -> SelectBuilder {
    SelectBuilder::new("information_schema.columns")
        .select([
            "COLUMN_NAME",
            "DATA_TYPE",
            "COLUMN_KEY",
            "IS_NULLABLE",
            "COLUMN_DEFAULT",
            "EXTRA",
            "COLUMN_COMMENT",
            "CHARACTER_MAXIMUM_LENGTH",
        ])
        .where_(("TABLE_SCHEMA", CURRENT_DATABASE))
        .where_(("TABLE_NAME", table))
        .order_by_asc("ORDINAL_POSITION")
}

/// One row per indexed column, grouped by index and in key order
pub(crate) fn statistics_query(table: &str) -> SelectBuilder {
    SelectBuilder::new("information_schema.statistics")
        .select(["INDEX_NAME", "COLUMN_NAME", "NON_UNIQUE"])
        .where_(("TABLE_SCHEMA", CURRENT_DATABASE))
        .where_(("TABLE_NAME", table))
        .order_by_asc("INDEX_NAME")
        .order_by_asc("SEQ_IN_INDEX")
}

// Servers differ on label case for catalog columns.
fn field<'r>(row: &'r Row, label: &str) -> Option<&'r Value> {
    row.get(label).or_else(|| {
        row.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(label))
            .map(|(_, value)| value)
    })
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        other => Some(other.to_string()),
    }
}

fn text_field(row: &Row, label: &str) -> Option<String> {
    field(row, label).and_then(text)
}

fn required_text(table: &str, row: &Row, label: &str) -> Result<String> {
    text_field(row, label)
        .ok_or_else(|| Error::introspection(table, format!("catalog row without {label}")))
}

/// Empty comments are reported as absent
pub(crate) fn decode_comment(row: &Row) -> Option<String> {
    text_field(row, "table_comment").filter(|comment| !comment.is_empty())
}

pub(crate) fn decode_column(table: &str, row: &Row) -> Result<ColumnMeta> {
    let name = required_text(table, row, "COLUMN_NAME")?;
    let data_type = required_text(table, row, "DATA_TYPE")?;
    let key = text_field(row, "COLUMN_KEY").unwrap_or_default();
    let extra = text_field(row, "EXTRA").unwrap_or_default();

    let default = match field(row, "COLUMN_DEFAULT") {
        Some(Value::Bytes(b)) => Value::String(String::from_utf8_lossy(b).into_owned()),
        Some(value) => value.clone(),
        None => Value::Null,
    };
    let length = field(row, "CHARACTER_MAXIMUM_LENGTH")
        .and_then(Value::as_i64)
        .and_then(|n| u64::try_from(n).ok());

    Ok(ColumnMeta::new(name, data_type)
        .with_primary(key == "PRI")
        .with_unique(key == "UNI")
        .with_nullable(text_field(row, "IS_NULLABLE").as_deref() == Some("YES"))
        .with_default(default)
        .with_auto_increment(extra.contains("auto_increment"))
        .with_length(length)
        .with_comment(text_field(row, "COLUMN_COMMENT").filter(|c| !c.is_empty())))
}

/// Group statistics rows by index name, keeping first-seen order.
///
/// Uniqueness is taken from the first row of each index.
pub(crate) fn decode_indexes(table: &str, rows: &[Row]) -> Result<Vec<(String, IndexMeta)>> {
    let mut indexes: Vec<(String, IndexMeta)> = Vec::new();

    for row in rows {
        let index_name = required_text(table, row, "INDEX_NAME")?;
        let column_name = required_text(table, row, "COLUMN_NAME")?;

        match indexes.iter_mut().find(|(name, _)| *name == index_name) {
            Some((_, index)) => index.columns.push(column_name),
            None => {
                let unique = field(row, "NON_UNIQUE").and_then(Value::as_i64) == Some(0);
                indexes.push((index_name, IndexMeta::new([column_name], unique)));
            }
        }
    }

    Ok(indexes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryBuilder;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_catalog_queries_use_database_marker() {
        let query = columns_query("users");
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT COLUMN_NAME, DATA_TYPE, COLUMN_KEY, IS_NULLABLE, COLUMN_DEFAULT, EXTRA, \
             COLUMN_COMMENT, CHARACTER_MAXIMUM_LENGTH FROM information_schema.columns \
             WHERE `TABLE_SCHEMA` = DATABASE() AND `TABLE_NAME` = ? ORDER BY `ORDINAL_POSITION` ASC"
        );
        assert_eq!(query.bindings(), vec![Value::from("users")]);

        assert_eq!(
            comment_query("users").to_sql().unwrap(),
            "SELECT table_comment FROM information_schema.tables \
             WHERE `table_schema` = DATABASE() AND `table_name` = ?"
        );
        assert_eq!(statistics_query("users").bindings().len(), 1);
    }

    #[test]
    fn test_decode_column() {
        let column = decode_column(
            "users",
            &row(&[
                ("COLUMN_NAME", Value::from("id")),
                ("DATA_TYPE", Value::from("int")),
                ("COLUMN_KEY", Value::from("PRI")),
                ("IS_NULLABLE", Value::from("NO")),
                ("COLUMN_DEFAULT", Value::Null),
                ("EXTRA", Value::from("auto_increment")),
                ("COLUMN_COMMENT", Value::from("")),
                ("CHARACTER_MAXIMUM_LENGTH", Value::Null),
            ]),
        )
        .unwrap();

        assert_eq!(column.name(), "id");
        assert!(column.is_primary());
        assert!(!column.is_unique());
        assert!(!column.is_nullable());
        assert!(column.is_auto_increment());
        assert_eq!(column.default(), None);
        assert_eq!(column.comment(), None);
        assert_eq!(column.length(), None);
    }

    #[test]
    fn test_decode_column_lowercase_labels_and_bytes() {
        let column = decode_column(
            "users",
            &row(&[
                ("column_name", Value::Bytes(b"email".to_vec())),
                ("data_type", Value::from("varchar")),
                ("column_key", Value::from("UNI")),
                ("is_nullable", Value::from("YES")),
                ("column_default", Value::Bytes(b"none".to_vec())),
                ("extra", Value::from("")),
                ("column_comment", Value::from("login")),
                ("character_maximum_length", Value::I64(255)),
            ]),
        )
        .unwrap();

        assert_eq!(column.name(), "email");
        assert!(column.is_unique());
        assert!(column.is_nullable());
        assert_eq!(column.default(), Some(&Value::from("none")));
        assert_eq!(column.length(), Some(255));
        assert_eq!(column.comment(), Some("login"));
    }

    #[test]
    fn test_decode_column_without_name_fails() {
        let err = decode_column("users", &row(&[("DATA_TYPE", Value::from("int"))])).unwrap_err();
        assert!(matches!(err, Error::Introspection { .. }));
    }

    #[test]
    fn test_decode_indexes_groups_by_name() {
        let rows = vec![
            row(&[
                ("INDEX_NAME", Value::from("PRIMARY")),
                ("COLUMN_NAME", Value::from("id")),
                ("NON_UNIQUE", Value::I64(0)),
            ]),
            row(&[
                ("INDEX_NAME", Value::from("idx_name")),
                ("COLUMN_NAME", Value::from("last_name")),
                ("NON_UNIQUE", Value::from("1")),
            ]),
            row(&[
                ("INDEX_NAME", Value::from("idx_name")),
                ("COLUMN_NAME", Value::from("first_name")),
                ("NON_UNIQUE", Value::from("1")),
            ]),
        ];

        let indexes = decode_indexes("users", &rows).unwrap();
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].0, "PRIMARY");
        assert!(indexes[0].1.unique);
        assert_eq!(indexes[1].1.columns, vec!["last_name", "first_name"]);
        assert!(!indexes[1].1.unique);
    }

    #[test]
    fn test_empty_comment_is_none() {
        assert_eq!(decode_comment(&row(&[("table_comment", Value::from(""))])), None);
        assert_eq!(
            decode_comment(&row(&[("TABLE_COMMENT", Value::from("Accounts"))])),
            Some("Accounts".to_string())
        );
    }
}
