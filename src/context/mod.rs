//! Row-by-row persistence with change tracking.
//!
//! A [`CustomerContext`] owns one pooled connection and a list of tracked
//! entities. Nothing is written until [`CustomerContext::save_changes`], which
//! stamps audit timestamps and flushes every pending entry in one transaction,
//! one statement per row. This is the slow baseline the bulk path is measured
//! against.

pub mod audit;
pub mod queries;

use crate::bulk::error::{BulkError, BulkResult};
use crate::bulk::session;
use crate::models::Customer;
use audit::{Auditable, EntryState};
use chrono::Utc;
use rocket_db_pools::sqlx::{self, Connection, PgConnection, PgPool, Postgres, pool::PoolConnection};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const INSERT_CUSTOMER: &str = "INSERT INTO customers \
     (first_name, last_name, email, contact_number, address, created_date, modified_date) \
     VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id";

const UPDATE_CUSTOMER: &str = "UPDATE customers SET \
     first_name = $1, last_name = $2, email = $3, contact_number = $4, address = $5, \
     modified_date = $6 WHERE id = $7";

#[derive(Debug)]
struct Entry {
    entity: Customer,
    state: EntryState,
}

pub struct CustomerContext {
    conn: Option<PoolConnection<Postgres>>,
    entries: Vec<Entry>,
    command_timeout: Duration,
}

impl CustomerContext {
    pub async fn open(
        pool: &PgPool,
        command_timeout: Duration,
        cancel: &CancellationToken,
    ) -> BulkResult<Self> {
        let conn = session::acquire(pool, cancel).await?;
        Ok(Self {
            conn: Some(conn),
            entries: Vec::new(),
            command_timeout,
        })
    }

    /// The context's connection, for queries outside change tracking.
    pub fn connection(&mut self) -> BulkResult<&mut PgConnection> {
        self.conn
            .as_deref_mut()
            .ok_or(BulkError::ConnectionFailure(sqlx::Error::PoolClosed))
    }

    /// Track a new customer. Its id is assigned by the database on save.
    pub fn add(&mut self, customer: Customer) {
        self.track(customer, EntryState::Added);
    }

    pub fn add_range(&mut self, customers: impl IntoIterator<Item = Customer>) {
        for customer in customers {
            self.add(customer);
        }
    }

    /// Track an existing customer whose fields have changed.
    pub fn update(&mut self, customer: Customer) {
        self.track(customer, EntryState::Modified);
    }

    pub fn update_range(&mut self, customers: impl IntoIterator<Item = Customer>) {
        for customer in customers {
            self.update(customer);
        }
    }

    fn track(&mut self, entity: Customer, state: EntryState) {
        self.entries.push(Entry { entity, state });
    }

    pub fn into_entities(self) -> Vec<Customer> {
        self.entries.into_iter().map(|entry| entry.entity).collect()
    }

    fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state != EntryState::Unchanged)
            .count()
    }

    /// Stamp and write every pending entry in one transaction.
    ///
    /// Returns the number of rows written. On failure nothing is committed
    /// and the connection is closed rather than returned to the pool.
    pub async fn save_changes(&mut self, cancel: &CancellationToken) -> BulkResult<u64> {
        let pending = self.pending();
        if pending == 0 {
            return Ok(0);
        }

        let now = Utc::now();
        for entry in &mut self.entries {
            entry.entity.stamp(entry.state, now);
        }

        let timeout = self.command_timeout;
        let conn = self
            .conn
            .as_deref_mut()
            .ok_or(BulkError::ConnectionFailure(sqlx::Error::PoolClosed))?;

        let outcome = session::guarded(
            "save changes",
            timeout,
            cancel,
            write_entries(conn, &mut self.entries),
        )
        .await;

        match outcome {
            Ok(written) => {
                for entry in &mut self.entries {
                    entry.state = EntryState::Unchanged;
                }
                log::debug!("saved {} of {} tracked customers", written, pending);
                Ok(written)
            }
            Err(e) => {
                log::error!("saving {} tracked customers failed: {}", pending, e);
                if let Some(conn) = self.conn.take() {
                    session::discard(conn);
                }
                Err(e)
            }
        }
    }
}

async fn write_entries(conn: &mut PgConnection, entries: &mut [Entry]) -> BulkResult<u64> {
    let mut tx = conn.begin().await?;
    let mut written = 0u64;

    for entry in entries.iter_mut() {
        let customer = &mut entry.entity;
        match entry.state {
            EntryState::Added => {
                customer.id = sqlx::query_scalar(INSERT_CUSTOMER)
                    .bind(&customer.first_name)
                    .bind(&customer.last_name)
                    .bind(&customer.email)
                    .bind(&customer.contact_number)
                    .bind(&customer.address)
                    .bind(customer.created_date)
                    .bind(customer.modified_date)
                    .fetch_one(&mut *tx)
                    .await?;
                written += 1;
            }
            EntryState::Modified => {
                written += sqlx::query(UPDATE_CUSTOMER)
                    .bind(&customer.first_name)
                    .bind(&customer.last_name)
                    .bind(&customer.email)
                    .bind(&customer.contact_number)
                    .bind(&customer.address)
                    .bind(customer.modified_date)
                    .bind(customer.id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
            }
            EntryState::Unchanged => {}
        }
    }

    tx.commit().await?;
    Ok(written)
}
