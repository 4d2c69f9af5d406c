use rocket_db_pools::sqlx;
use std::time::Duration;
use thiserror::Error;

/// Errors raised anywhere along the bulk write path.
#[derive(Debug, Error)]
pub enum BulkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cannot derive a tabular schema from an empty record list")]
    EmptyInput,
    #[error("destination column `{column}` has no source column to map from")]
    ColumnMapping { column: String },
    #[error("database connection failure: {0}")]
    ConnectionFailure(sqlx::Error),
    #[error("database command failure: {0}")]
    CommandFailure(sqlx::Error),
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error("operation cancelled")]
    Cancelled,
    #[error("record generation failed: {0}")]
    Generator(String),
}

impl BulkError {
    pub fn invalid_quantity(quantity: i64) -> Self {
        BulkError::InvalidArgument(format!("quantity must be positive, got {quantity}"))
    }

    pub fn quantity_too_large(quantity: i64, max: usize) -> Self {
        BulkError::InvalidArgument(format!("quantity must be at most {max}, got {quantity}"))
    }

    /// Classify a driver error raised while obtaining a pooled connection.
    pub fn connection(err: sqlx::Error) -> Self {
        BulkError::ConnectionFailure(err)
    }

    /// Classify a driver error raised by a statement, copy or commit.
    pub fn command(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => BulkError::ConnectionFailure(err),
            other => BulkError::CommandFailure(other),
        }
    }
}

impl From<sqlx::Error> for BulkError {
    fn from(err: sqlx::Error) -> Self {
        BulkError::command(err)
    }
}

pub type BulkResult<T> = Result<T, BulkError>;
