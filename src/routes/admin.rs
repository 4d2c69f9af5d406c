//! Destructive maintenance endpoints, mounted only when
//! `BULK_ENABLE_ADMIN_ROUTES` is set.

use crate::bulk::session;
use crate::context::queries;
use crate::error::ApiError;
use crate::models::{AffectedRows, DataResponse};
use crate::routes::guards::RequestCancellation;
use crate::state::BulkServices;
use rocket::serde::json::Json;
use rocket::{Route, State};
use rocket_db_pools::sqlx::PgPool;

/// Truncate the customers table. Requires `confirm=true`.
#[delete("/admin/customers?<confirm>")]
pub async fn delete_all(
    confirm: Option<bool>,
    pool: &State<PgPool>,
    services: &State<BulkServices>,
    cancel: RequestCancellation,
) -> Result<Json<DataResponse<AffectedRows>>, ApiError> {
    if confirm != Some(true) {
        return Err(ApiError::BadRequest(
            "refusing to truncate customers without confirm=true".into(),
        ));
    }

    let mut conn = session::acquire(pool.inner(), cancel.token()).await?;
    let truncated = session::guarded(
        "truncate customers",
        services.config.command_timeout,
        cancel.token(),
        queries::truncate(&mut conn),
    )
    .await?;

    Ok(Json(DataResponse {
        data: AffectedRows::new(truncated),
    }))
}

pub fn routes() -> Vec<Route> {
    routes![delete_all]
}
