#![allow(dead_code)]

use customer_bulk_api::bulk::{
    BulkConfig, BulkCopyExecutor, RecordGenerator, TabularRecord, stage,
};
use customer_bulk_api::context::audit::{EntryState, stamp_all};
use customer_bulk_api::models::{CUSTOMER_SELECT_COLUMNS, Customer};
use customer_bulk_api::test_support::{TestDatabase, TestDatabaseError};
use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Start a database, or `None` when no container runtime is reachable.
pub async fn database_or_skip(test: &str) -> Option<TestDatabase> {
    match TestDatabase::new().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping {test}: container runtime unavailable ({err})");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

pub fn test_config() -> BulkConfig {
    BulkConfig {
        copy_timeout: Duration::from_secs(60),
        command_timeout: Duration::from_secs(30),
        copy_batch_size: 250,
        copy_notify_after: 100,
        create_chunk_size: 64,
        update_chunk_size: 16,
        max_quantity: 10_000,
        enable_admin_routes: true,
    }
}

pub fn generator() -> RecordGenerator {
    RecordGenerator::new(4, 64, 16).expect("thread pool")
}

/// Bulk-insert `quantity` fresh customers and return them as written.
pub async fn seed(pool: &PgPool, quantity: i64) -> Vec<Customer> {
    let mut customers = generator().generate(quantity).expect("generate");
    stamp_all(&mut customers, EntryState::Added, Utc::now());
    let data = stage(&customers).expect("stage");

    let report = BulkCopyExecutor::new(pool.clone(), test_config())
        .execute(&data, &Customer::SCHEMA, &CancellationToken::new())
        .await
        .expect("seed copy");
    assert_eq!(report.rows_copied, quantity as u64);

    customers
}

pub async fn count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(pool)
        .await
        .expect("count customers")
}

pub async fn all_by_id(pool: &PgPool) -> Vec<Customer> {
    let sql = format!("SELECT {CUSTOMER_SELECT_COLUMNS} FROM customers ORDER BY id");
    sqlx::query_as::<_, Customer>(&sql)
        .fetch_all(pool)
        .await
        .expect("load customers")
}
