//! Read and maintenance queries against the `customers` table.

use crate::bulk::schema::TabularRecord;
use crate::bulk::statements;
use crate::models::{CUSTOMER_SELECT_COLUMNS, Customer};
use rocket_db_pools::sqlx::{self, Connection, PgConnection, PgExecutor};
use uuid::Uuid;

/// Up to `limit` existing rows chosen at random.
pub async fn fetch_random<'c>(
    executor: impl PgExecutor<'c>,
    limit: i64,
) -> Result<Vec<Customer>, sqlx::Error> {
    let sql = format!("SELECT {CUSTOMER_SELECT_COLUMNS} FROM customers ORDER BY random() LIMIT $1");
    sqlx::query_as::<_, Customer>(&sql)
        .bind(limit)
        .fetch_all(executor)
        .await
}

pub async fn fetch_all<'c>(executor: impl PgExecutor<'c>) -> Result<Vec<Customer>, sqlx::Error> {
    let sql = format!("SELECT {CUSTOMER_SELECT_COLUMNS} FROM customers ORDER BY created_date, id");
    sqlx::query_as::<_, Customer>(&sql).fetch_all(executor).await
}

pub async fn fetch_one<'c>(
    executor: impl PgExecutor<'c>,
    id: Uuid,
) -> Result<Option<Customer>, sqlx::Error> {
    let sql = format!("SELECT {CUSTOMER_SELECT_COLUMNS} FROM customers WHERE id = $1");
    sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn count<'c>(executor: impl PgExecutor<'c>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(executor)
        .await
}

/// Empty the table, returning how many rows it held.
///
/// Not coordinated with writes running on other connections.
pub async fn truncate(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let mut tx = conn.begin().await?;
    let existing = count(&mut *tx).await?;
    let sql = statements::truncate_table(&Customer::SCHEMA);
    log::warn!("{} ({} rows)", sql, existing);
    sqlx::query(&sql).execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(existing.max(0) as u64)
}
