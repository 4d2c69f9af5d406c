use crate::error::ApiError;
use crate::state::ShutdownSignal;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use tokio_util::sync::CancellationToken;

/// Cancellation token for one request, a child of the shutdown signal.
#[derive(Debug, Clone)]
pub struct RequestCancellation(pub CancellationToken);

impl RequestCancellation {
    pub fn token(&self) -> &CancellationToken {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestCancellation {
    type Error = ApiError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request.guard::<&State<ShutdownSignal>>().await {
            Outcome::Success(signal) if signal.is_triggered() => {
                let err = ApiError::Cancelled("server is shutting down".into());
                Outcome::Error((err.status(), err))
            }
            Outcome::Success(signal) => Outcome::Success(RequestCancellation(signal.child())),
            _ => {
                let err = ApiError::InternalError("shutdown signal not managed".into());
                Outcome::Error((err.status(), err))
            }
        }
    }
}
