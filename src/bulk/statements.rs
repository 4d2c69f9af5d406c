//! SQL text for the bulk path.
//!
//! Table and column names come from static [`TableSchema`] declarations or
//! from [`temp_table_name`], never from request input; they are still quoted
//! so reserved words and mixed case survive.

use crate::bulk::schema::TableSchema;
use std::time::Duration;
use uuid::Uuid;

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quoted_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fresh staging table name, unique across concurrent operations.
///
/// Built from a random v4 UUID rather than a counter so independent processes
/// sharing a database cannot collide either. Stays under the 63 byte
/// identifier limit.
pub fn temp_table_name() -> String {
    format!("bulk_update_{}", Uuid::new_v4().simple())
}

/// Create a session-scoped, empty copy of the destination's column set.
pub fn create_temp_table(temp_table: &str, schema: &TableSchema) -> String {
    format!(
        "CREATE TEMP TABLE {} AS SELECT {} FROM {} WITH NO DATA",
        quote_ident(temp_table),
        quoted_list(schema.column_names()),
        quote_ident(schema.table)
    )
}

pub fn drop_temp_table(temp_table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(temp_table))
}

/// `COPY ... FROM STDIN` in text format with an explicit column list.
pub fn copy_from_stdin<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
    format!(
        "COPY {} ({}) FROM STDIN",
        quote_ident(table),
        quoted_list(columns)
    )
}

/// Set-based update joining the destination to the staging table on the key.
///
/// The key column is the join condition and is never assigned.
pub fn update_from_temp(schema: &TableSchema, temp_table: &str) -> String {
    let destination = quote_ident(schema.table);
    let temp = quote_ident(temp_table);
    let key = quote_ident(schema.key_column);

    let assignments = schema
        .updatable_columns()
        .map(|column| {
            let column = quote_ident(column);
            format!("{column} = {temp}.{column}")
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "UPDATE {destination} SET {assignments} FROM {temp} WHERE {destination}.{key} = {temp}.{key}"
    )
}

pub fn truncate_table(schema: &TableSchema) -> String {
    format!("TRUNCATE TABLE {}", quote_ident(schema.table))
}

/// Server-side guard scoped to the current transaction.
pub fn set_local_statement_timeout(limit: Duration) -> String {
    format!("SET LOCAL statement_timeout = {}", limit.as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::schema::TabularRecord;
    use crate::models::Customer;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn temp_table_creation_copies_every_column_with_no_rows() {
        let sql = create_temp_table("bulk_update_x", &Customer::SCHEMA);
        assert_eq!(
            sql,
            "CREATE TEMP TABLE \"bulk_update_x\" AS SELECT \"id\", \"first_name\", \"last_name\", \
             \"email\", \"contact_number\", \"address\", \"created_date\", \"modified_date\" \
             FROM \"customers\" WITH NO DATA"
        );
    }

    #[test]
    fn update_never_assigns_the_key() {
        let sql = update_from_temp(&Customer::SCHEMA, "bulk_update_x");
        let set_clause = sql
            .split(" SET ")
            .nth(1)
            .and_then(|rest| rest.split(" FROM ").next())
            .unwrap();
        assert!(!set_clause.contains("\"id\" ="));
        assert!(set_clause.contains("\"first_name\" = \"bulk_update_x\".\"first_name\""));
        assert!(set_clause.contains("\"modified_date\" = \"bulk_update_x\".\"modified_date\""));
        assert_eq!(set_clause.matches(" = ").count(), Customer::SCHEMA.columns.len() - 1);
        assert!(sql.ends_with("WHERE \"customers\".\"id\" = \"bulk_update_x\".\"id\""));
    }

    #[test]
    fn copy_statement_lists_columns_explicitly() {
        let sql = copy_from_stdin("customers", ["email", "id"]);
        assert_eq!(sql, "COPY \"customers\" (\"email\", \"id\") FROM STDIN");
    }

    #[test]
    fn statement_timeout_is_in_milliseconds() {
        assert_eq!(
            set_local_statement_timeout(Duration::from_secs(300)),
            "SET LOCAL statement_timeout = 300000"
        );
    }

    #[test]
    fn temp_table_names_fit_postgres_identifier_limit() {
        let name = temp_table_name();
        assert!(name.len() <= 63);
        assert!(name.starts_with("bulk_update_"));
    }

    #[test]
    fn concurrent_temp_table_names_never_collide() {
        let seen = Arc::new(Mutex::new(HashSet::new()));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let seen = Arc::clone(&seen);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let name = temp_table_name();
                        assert!(seen.lock().unwrap().insert(name));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(seen.lock().unwrap().len(), 16 * 500);
    }
}
