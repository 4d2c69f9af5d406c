//! Set-based update through a session-scoped staging table.
//!
//! One bulk update runs entirely on a single pooled connection: the temp
//! table is only visible to the session that created it, so the create, the
//! copy, the update and the drop must all share that session.

use crate::bulk::config::BulkConfig;
use crate::bulk::copy::{BulkCopy, BulkCopyOptions, ColumnMapping, ProgressFn};
use crate::bulk::error::{BulkError, BulkResult};
use crate::bulk::insert::copy_in_transaction;
use crate::bulk::schema::TableSchema;
use crate::bulk::session;
use crate::bulk::stager::TabularData;
use crate::bulk::statements;
use rocket_db_pools::sqlx::{self, Connection, PgConnection, PgPool};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdateReport {
    pub rows_affected: u64,
    pub temp_table: String,
    pub elapsed: Duration,
}

#[derive(Clone)]
pub struct BulkUpdateExecutor {
    pool: PgPool,
    config: BulkConfig,
}

impl BulkUpdateExecutor {
    pub fn new(pool: PgPool, config: BulkConfig) -> Self {
        Self { pool, config }
    }

    /// Overwrite every non-key column of the rows in `data`, matched on the
    /// schema's key column.
    ///
    /// Rows whose key does not exist in the destination are ignored; the
    /// returned count only covers rows that matched.
    pub async fn execute(
        &self,
        data: &TabularData,
        schema: &TableSchema,
        cancel: &CancellationToken,
    ) -> BulkResult<BulkUpdateReport> {
        self.execute_with_progress(data, schema, cancel, None).await
    }

    /// As [`execute`](Self::execute), reporting rows staged into the temp
    /// table as the copy runs.
    pub async fn execute_with_progress(
        &self,
        data: &TabularData,
        schema: &TableSchema,
        cancel: &CancellationToken,
        on_progress: Option<ProgressFn>,
    ) -> BulkResult<BulkUpdateReport> {
        if data.is_empty() {
            return Err(BulkError::EmptyInput);
        }

        let started = Instant::now();
        let temp_table = statements::temp_table_name();

        let mut conn = session::acquire(&self.pool, cancel)
            .await
            .inspect_err(|e| log::error!("bulk update of {}: {}", schema.table, e))?;

        let rows_affected = match self
            .stage_and_update(&mut conn, data, schema, &temp_table, cancel, on_progress)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                log::error!(
                    "bulk update of {} via {} failed after {:?}: {}",
                    schema.table,
                    temp_table,
                    started.elapsed(),
                    e
                );
                session::discard(conn);
                return Err(e);
            }
        };

        let drop = statements::drop_temp_table(&temp_table);
        log::debug!("{}", drop);
        let dropped = session::guarded(
            "drop temp table",
            self.config.command_timeout,
            cancel,
            sqlx::query(&drop).execute(&mut *conn),
        )
        .await;
        if let Err(e) = dropped {
            // The update already landed; closing the session removes the table.
            log::warn!("could not drop {}: {}; closing connection", temp_table, e);
            session::discard(conn);
        }

        let elapsed = started.elapsed();
        log::info!(
            "bulk update of {} finished: {} of {} rows affected in {:?}",
            schema.table,
            rows_affected,
            data.row_count(),
            elapsed
        );

        Ok(BulkUpdateReport {
            rows_affected,
            temp_table,
            elapsed,
        })
    }

    async fn stage_and_update(
        &self,
        conn: &mut PgConnection,
        data: &TabularData,
        schema: &TableSchema,
        temp_table: &str,
        cancel: &CancellationToken,
        on_progress: Option<ProgressFn>,
    ) -> BulkResult<u64> {
        let command_timeout = self.config.command_timeout;

        let create = statements::create_temp_table(temp_table, schema);
        log::info!("{}", create);
        session::guarded(
            "create temp table",
            command_timeout,
            cancel,
            sqlx::query(&create).execute(&mut *conn),
        )
        .await?;

        let copy = BulkCopy::new(
            BulkCopyOptions::from_config(temp_table, &self.config),
            ColumnMapping::by_name(schema),
        )
        .on_progress(on_progress);
        let staged = copy_in_transaction(conn, &copy, data, &self.config, cancel).await?;
        log::debug!("staged {} rows into {}", staged, temp_table);

        let update = statements::update_from_temp(schema, temp_table);
        log::info!("{}", update);
        update_in_transaction(conn, &update, command_timeout, cancel).await
    }
}

/// Run the set-based update in its own transaction and commit.
///
/// The transaction carries a server-side statement timeout of `limit`, so a
/// statement abandoned on the client cannot keep running and land later.
async fn update_in_transaction(
    conn: &mut PgConnection,
    update: &str,
    limit: Duration,
    cancel: &CancellationToken,
) -> BulkResult<u64> {
    let mut tx = session::guarded("begin transaction", limit, cancel, conn.begin()).await?;
    session::guarded(
        "set statement timeout",
        limit,
        cancel,
        session::set_transaction_timeout(&mut tx, limit),
    )
    .await?;

    let result = session::guarded(
        "set-based update",
        limit,
        cancel,
        sqlx::query(update).execute(&mut *tx),
    )
    .await?;

    session::guarded("commit", limit, cancel, tx.commit()).await?;
    Ok(result.rows_affected())
}
