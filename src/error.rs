use crate::bulk::BulkError;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_db_pools::sqlx;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[derive(Debug)]
pub enum ApiError {
    DatabaseError(sqlx::Error),
    NotFound(String),
    BadRequest(String),
    Cancelled(String),
    Timeout(String),
    InternalError(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::Cancelled(_) => Status::ServiceUnavailable,
            ApiError::Timeout(_) => Status::GatewayTimeout,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                Status::InternalServerError
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::DatabaseError(_) => "DatabaseError",
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::Cancelled(_) => "Cancelled",
            ApiError::Timeout(_) => "Timeout",
            ApiError::InternalError(_) => "InternalError",
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let error = self.kind().to_string();
        let message = match self {
            ApiError::DatabaseError(e) => {
                log::error!("database error: {}", e);
                e.to_string()
            }
            ApiError::InternalError(msg) => {
                log::error!("internal error: {}", msg);
                msg
            }
            ApiError::Cancelled(msg) | ApiError::Timeout(msg) => {
                log::warn!("{}", msg);
                msg
            }
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => {
                log::debug!("{}: {}", error, msg);
                msg
            }
        };

        let json = serde_json::to_string(&ErrorResponse { error, message }).unwrap_or_else(|_| {
            r#"{"error":"SerializationError","message":"Failed to serialize error"}"#.to_string()
        });

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::DatabaseError(err),
        }
    }
}

impl From<BulkError> for ApiError {
    fn from(err: BulkError) -> Self {
        match err {
            BulkError::InvalidArgument(_) | BulkError::EmptyInput => {
                ApiError::BadRequest(err.to_string())
            }
            BulkError::Cancelled => ApiError::Cancelled(err.to_string()),
            BulkError::Timeout { .. } => ApiError::Timeout(err.to_string()),
            BulkError::ConnectionFailure(e) | BulkError::CommandFailure(e) => {
                ApiError::DatabaseError(e)
            }
            BulkError::ColumnMapping { .. } | BulkError::Generator(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn bulk_errors_map_to_documented_statuses() {
        let cases = [
            (BulkError::invalid_quantity(0), Status::BadRequest),
            (BulkError::EmptyInput, Status::BadRequest),
            (BulkError::Cancelled, Status::ServiceUnavailable),
            (
                BulkError::Timeout {
                    operation: "bulk copy",
                    after: Duration::from_secs(300),
                },
                Status::GatewayTimeout,
            ),
            (
                BulkError::ColumnMapping {
                    column: "email".into(),
                },
                Status::InternalServerError,
            ),
            (
                BulkError::CommandFailure(sqlx::Error::Protocol("bad".into())),
                Status::InternalServerError,
            ),
            (
                BulkError::Generator("pool gone".into()),
                Status::InternalServerError,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn missing_rows_become_not_found() {
        assert_eq!(
            ApiError::from(sqlx::Error::RowNotFound).status(),
            Status::NotFound
        );
    }
}
