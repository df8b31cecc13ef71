//! Run against a live server (a `.env` file is read if present):
//! `TABULA_DB_NAME=shop cargo run --example table_schema --features mysql -- users`

use tabula_core::{MySqlConnection, SelectOptions, TableSchema, Value};

fn main() -> tabula_core::Result<()> {
    dotenvy::dotenv().ok();

    let table = std::env::args().nth(1).unwrap_or_else(|| "users".to_string());
    let mut conn = MySqlConnection::from_env()?;

    let schema = TableSchema::load(&table, &mut conn);
    println!("{}", schema.to_json()?);

    if let Some(pk) = schema.primary_key() {
        println!("primary key: {} ({})", pk.name(), pk.sql_type());
    }

    let options = SelectOptions::new().limit(5);
    for row in schema.select(&mut conn, &options) {
        let rendered: Vec<String> = schema
            .columns()
            .names()
            .map(|name| format!("{name}={}", row.get(name).unwrap_or(&Value::Null)))
            .collect();
        println!("{}", rendered.join(", "));
    }

    Ok(())
}
