use tabula_core::{delete, from, insert, op, update, QueryBuilder, Value, CURRENT_DATABASE};

fn main() -> tabula_core::Result<()> {
    // SELECT with implicit AND between where_ calls
    let select_query = from("users")
        .select(("id", "name", "email"))
        .where_(("age", op::GT, 18))
        .where_(("status", "active"))
        .where_(("city", "LIKE", "%York%"))
        .order_by("name", "asc")
        .limit(10)
        .offset(5);

    println!("SELECT SQL: {}", select_query.to_sql()?);
    println!("Bindings:   {:?}", select_query.bindings());
    println!("Inlined:    {}", select_query.to_raw_sql()?);

    // Joins keep the joined table quoted and the ON columns as written
    let join_query = from("users")
        .select(("users.id", "orders.total"))
        .left_join("orders", "users.id", op::EQ, "orders.user_id")
        .where_(("orders.status", "paid"));
    println!("JOIN SQL:   {}", join_query.to_sql()?);

    // Catalog lookups compare against the session database inline
    let catalog_query = from("information_schema.columns")
        .select(("COLUMN_NAME", "DATA_TYPE"))
        .where_(("TABLE_SCHEMA", CURRENT_DATABASE))
        .where_(("TABLE_NAME", "users"));
    println!("Catalog SQL: {}", catalog_query.to_sql()?);

    let insert_query = insert("users").values([
        ("name", Value::from("John Doe")),
        ("email", Value::from("john@example.com")),
        ("age", Value::from(30)),
    ]);
    println!("INSERT SQL: {}", insert_query.to_sql()?);

    let update_query = update("users")
        .set([("email", "newemail@example.com")])
        .where_(("id", 123))
        .and_where(("active", true));
    println!("UPDATE SQL: {}", update_query.to_sql()?);

    let delete_query = delete("users")
        .where_(("age", op::LT, 13))
        .or_where(("last_login", op::LT, "2020-01-01"));
    println!("DELETE SQL: {}", delete_query.to_sql()?);

    Ok(())
}
