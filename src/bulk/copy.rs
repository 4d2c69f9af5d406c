//! Streaming a [`TabularData`] into a table with `COPY ... FROM STDIN`.
//!
//! Columns are always mapped by name: each destination column named by the
//! schema is paired with the source column of the same name, and rows are
//! encoded in destination order. Source column order therefore never matters,
//! and a destination column with no source counterpart fails before any data
//! is sent.

use crate::bulk::config::BulkConfig;
use crate::bulk::error::{BulkError, BulkResult};
use crate::bulk::schema::{CellValue, TableSchema};
use crate::bulk::session;
use crate::bulk::stager::TabularData;
use crate::bulk::statements;
use rocket_db_pools::sqlx::PgConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Progress callback, invoked with the running row count.
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Pairs a source column with a destination column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub source: &'static str,
    pub destination: &'static str,
}

impl ColumnMapping {
    /// Same name on both sides for every destination column.
    pub fn by_name(schema: &TableSchema) -> Vec<Self> {
        schema
            .column_names()
            .map(|name| ColumnMapping {
                source: name,
                destination: name,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct BulkCopyOptions {
    pub destination_table: String,
    pub batch_size: usize,
    pub notify_after: usize,
    pub timeout: Duration,
}

impl BulkCopyOptions {
    pub fn from_config(destination_table: impl Into<String>, config: &BulkConfig) -> Self {
        Self {
            destination_table: destination_table.into(),
            batch_size: config.copy_batch_size,
            notify_after: config.copy_notify_after,
            timeout: config.copy_timeout,
        }
    }
}

/// One configured copy operation against a single destination.
pub struct BulkCopy {
    options: BulkCopyOptions,
    mappings: Vec<ColumnMapping>,
    on_progress: Option<ProgressFn>,
}

impl BulkCopy {
    pub fn new(options: BulkCopyOptions, mappings: Vec<ColumnMapping>) -> Self {
        Self {
            options,
            mappings,
            on_progress: None,
        }
    }

    pub fn on_progress(mut self, callback: Option<ProgressFn>) -> Self {
        self.on_progress = callback;
        self
    }

    /// Source column index for every mapping, in mapping order.
    fn resolve(&self, data: &TabularData) -> BulkResult<Vec<usize>> {
        self.mappings
            .iter()
            .map(|mapping| {
                data.column_index(mapping.source)
                    .ok_or_else(|| BulkError::ColumnMapping {
                        column: mapping.destination.to_string(),
                    })
            })
            .collect()
    }

    fn notify(&self, rows: u64) {
        log::debug!(
            "bulk copy into {}: {} rows sent",
            self.options.destination_table,
            rows
        );
        if let Some(callback) = &self.on_progress {
            callback(rows);
        }
    }

    /// Stream every row of `data` and finish the copy on `conn`.
    ///
    /// The caller owns the surrounding transaction; nothing is committed here.
    /// Returns the row count reported by the server.
    pub async fn write_to_server(
        &self,
        conn: &mut PgConnection,
        data: &TabularData,
        cancel: &CancellationToken,
    ) -> BulkResult<u64> {
        let indexes = self.resolve(data)?;
        let statement = statements::copy_from_stdin(
            &self.options.destination_table,
            self.mappings.iter().map(|mapping| mapping.destination),
        );

        session::guarded(
            "bulk copy",
            self.options.timeout,
            cancel,
            self.stream(conn, &statement, data, &indexes, cancel),
        )
        .await
    }

    async fn stream(
        &self,
        conn: &mut PgConnection,
        statement: &str,
        data: &TabularData,
        indexes: &[usize],
        cancel: &CancellationToken,
    ) -> BulkResult<u64> {
        let batch_size = self.options.batch_size.max(1);
        let notify_after = self.options.notify_after.max(1) as u64;

        let mut copy = conn.copy_in_raw(statement).await?;
        let mut buffer = String::new();
        let mut sent: u64 = 0;
        let mut next_notification = notify_after;

        for batch in data.rows().chunks(batch_size) {
            if cancel.is_cancelled() {
                if let Err(e) = copy.abort("bulk copy cancelled").await {
                    log::warn!("failed to abort cancelled bulk copy: {}", e);
                }
                return Err(BulkError::Cancelled);
            }

            buffer.clear();
            encode_rows(batch, indexes, &mut buffer);
            copy.send(buffer.as_bytes()).await?;

            sent += batch.len() as u64;
            while sent >= next_notification {
                self.notify(next_notification);
                next_notification += notify_after;
            }
        }

        Ok(copy.finish().await?)
    }
}

/// Encode rows as COPY text lines, picking cells by `indexes`.
pub fn encode_rows(rows: &[Vec<CellValue>], indexes: &[usize], out: &mut String) {
    for row in rows {
        for (position, &index) in indexes.iter().enumerate() {
            if position > 0 {
                out.push('\t');
            }
            row[index].write_copy_text(out);
        }
        out.push('\n');
    }
}
