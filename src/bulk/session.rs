//! Connection and statement plumbing shared by the bulk executors.
//!
//! Every database round trip on the bulk path goes through [`guarded`], which
//! races it against the caller's cancellation token and a client-side timeout.

use crate::bulk::error::{BulkError, BulkResult};
use crate::bulk::statements;
use rocket_db_pools::sqlx::{self, PgConnection, PgPool, Postgres, pool::PoolConnection};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// SQLSTATE raised when `statement_timeout` stops a statement.
const QUERY_CANCELED: &str = "57014";

/// Run one I/O step, bounded by `limit` and abandoned on cancellation.
///
/// Dropping the inner future on timeout or cancellation drops any open
/// transaction with it, which rolls it back. A server-side statement timeout
/// is reported the same way as the client-side one.
pub async fn guarded<T, E, F>(
    operation: &'static str,
    limit: Duration,
    cancel: &CancellationToken,
    step: F,
) -> BulkResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<BulkError>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BulkError::Cancelled),
        outcome = tokio::time::timeout(limit, step) => match outcome {
            Ok(result) => result.map_err(|e| match Into::<BulkError>::into(e) {
                BulkError::CommandFailure(sqlx::Error::Database(db))
                    if db.code().as_deref() == Some(QUERY_CANCELED) =>
                {
                    BulkError::Timeout { operation, after: limit }
                }
                other => other,
            }),
            Err(_) => Err(BulkError::Timeout { operation, after: limit }),
        },
    }
}

/// Check a connection out of the pool, honouring cancellation.
///
/// The pool's own acquire timeout bounds the wait.
pub async fn acquire(
    pool: &PgPool,
    cancel: &CancellationToken,
) -> BulkResult<PoolConnection<Postgres>> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BulkError::Cancelled),
        conn = pool.acquire() => conn.map_err(BulkError::connection),
    }
}

/// Take a connection out of the pool for good and close it.
///
/// Used after a failed operation: ending the session rolls back anything left
/// open and removes session-scoped temp tables, so no half-finished state is
/// handed to the next borrower.
pub fn discard(conn: PoolConnection<Postgres>) {
    drop(conn.detach());
}

/// Apply a server-side statement timeout to the current transaction.
pub async fn set_transaction_timeout(
    conn: &mut PgConnection,
    limit: Duration,
) -> Result<(), sqlx::Error> {
    sqlx::query(&statements::set_local_statement_timeout(limit))
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guarded_passes_results_through() {
        let cancel = CancellationToken::new();
        let value = guarded("noop", Duration::from_secs(1), &cancel, async {
            Ok::<_, BulkError>(42)
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn guarded_reports_timeouts() {
        let cancel = CancellationToken::new();
        let outcome = guarded("slow step", Duration::from_millis(10), &cancel, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, BulkError>(())
        })
        .await;
        match outcome {
            Err(BulkError::Timeout { operation, .. }) => assert_eq!(operation, "slow step"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn guarded_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = guarded("cancelled", Duration::from_secs(1), &cancel, async {
            Ok::<_, BulkError>(())
        })
        .await;
        assert!(matches!(outcome, Err(BulkError::Cancelled)));
    }

    #[tokio::test]
    async fn guarded_maps_driver_errors() {
        let cancel = CancellationToken::new();
        let outcome: BulkResult<()> = guarded("failing", Duration::from_secs(1), &cancel, async {
            Err(sqlx::Error::Protocol("boom".into()))
        })
        .await;
        assert!(matches!(outcome, Err(BulkError::CommandFailure(_))));
    }
}
