use crate::bulk::config::BulkConfig;
use crate::bulk::copy::{BulkCopy, BulkCopyOptions, ColumnMapping, ProgressFn};
use crate::bulk::error::{BulkError, BulkResult};
use crate::bulk::schema::TableSchema;
use crate::bulk::session;
use crate::bulk::stager::TabularData;
use rocket_db_pools::sqlx::{Connection, PgConnection, PgPool};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkCopyReport {
    pub rows_copied: u64,
    pub elapsed: Duration,
}

/// Copy `data` inside its own transaction on `conn` and commit.
///
/// The transaction carries a server-side statement timeout equal to the copy
/// timeout. Any error leaves the transaction uncommitted.
pub(crate) async fn copy_in_transaction(
    conn: &mut PgConnection,
    copy: &BulkCopy,
    data: &TabularData,
    config: &BulkConfig,
    cancel: &CancellationToken,
) -> BulkResult<u64> {
    let mut tx = session::guarded("begin transaction", config.command_timeout, cancel, conn.begin())
        .await?;
    session::guarded(
        "set statement timeout",
        config.command_timeout,
        cancel,
        session::set_transaction_timeout(&mut tx, config.copy_timeout),
    )
    .await?;

    let rows = copy.write_to_server(&mut tx, data, cancel).await?;

    session::guarded("commit", config.command_timeout, cancel, tx.commit()).await?;
    Ok(rows)
}

/// Streams staged rows straight into their destination table.
#[derive(Clone)]
pub struct BulkCopyExecutor {
    pool: PgPool,
    config: BulkConfig,
}

impl BulkCopyExecutor {
    pub fn new(pool: PgPool, config: BulkConfig) -> Self {
        Self { pool, config }
    }

    pub async fn execute(
        &self,
        data: &TabularData,
        schema: &TableSchema,
        cancel: &CancellationToken,
    ) -> BulkResult<BulkCopyReport> {
        self.execute_with_progress(data, schema, cancel, None).await
    }

    pub async fn execute_with_progress(
        &self,
        data: &TabularData,
        schema: &TableSchema,
        cancel: &CancellationToken,
        on_progress: Option<ProgressFn>,
    ) -> BulkResult<BulkCopyReport> {
        if data.is_empty() {
            return Err(BulkError::EmptyInput);
        }

        let started = Instant::now();
        log::info!(
            "bulk copy of {} rows into {} starting",
            data.row_count(),
            schema.table
        );

        let mut conn = session::acquire(&self.pool, cancel)
            .await
            .inspect_err(|e| log::error!("bulk copy into {}: {}", schema.table, e))?;

        let copy = BulkCopy::new(
            BulkCopyOptions::from_config(schema.table, &self.config),
            ColumnMapping::by_name(schema),
        )
        .on_progress(on_progress);

        match copy_in_transaction(&mut conn, &copy, data, &self.config, cancel).await {
            Ok(rows_copied) => {
                let elapsed = started.elapsed();
                log::info!(
                    "bulk copy into {} finished: {} rows in {:?}",
                    schema.table,
                    rows_copied,
                    elapsed
                );
                Ok(BulkCopyReport {
                    rows_copied,
                    elapsed,
                })
            }
            Err(e) => {
                log::error!(
                    "bulk copy into {} failed after {:?}: {}",
                    schema.table,
                    started.elapsed(),
                    e
                );
                session::discard(conn);
                Err(e)
            }
        }
    }
}
