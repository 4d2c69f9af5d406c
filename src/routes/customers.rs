//! Customer endpoints: bulk and row-by-row writes side by side, plus reads.
//!
//! The `bulk-*` handlers go through the copy and temp-table executors; the
//! `create-many` / `update-many` handlers push the same work through
//! [`CustomerContext`] one statement per row.

use crate::bulk::generator::validate_quantity;
use crate::bulk::{TabularRecord, session, stage};
use crate::context::CustomerContext;
use crate::context::audit::{EntryState, stamp_all};
use crate::context::queries;
use crate::error::ApiError;
use crate::models::{AffectedRows, Customer, DataResponse};
use crate::routes::guards::RequestCancellation;
use crate::state::BulkServices;
use chrono::Utc;
use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::PgPool;
use uuid::Uuid;

type ApiResult<T> = Result<Json<DataResponse<T>>, ApiError>;

fn respond<T>(data: T) -> ApiResult<T> {
    Ok(Json(DataResponse { data }))
}

/// Generate `quantity` customers and stream them in with one `COPY`.
#[post("/customers/bulk-create?<quantity>")]
pub async fn bulk_create_many(
    quantity: i64,
    services: &State<BulkServices>,
    cancel: RequestCancellation,
) -> ApiResult<AffectedRows> {
    validate_quantity(quantity, services.config.max_quantity)?;

    let data = services
        .generator
        .spawn(move |generator| {
            let mut customers = generator.generate(quantity)?;
            stamp_all(&mut customers, EntryState::Added, Utc::now());
            stage(&customers)
        })
        .await?;

    let report = services
        .copier
        .execute(&data, &Customer::SCHEMA, cancel.token())
        .await?;

    respond(AffectedRows::new(report.rows_copied))
}

/// Generate `quantity` customers and insert them row by row.
#[post("/customers/create-many?<quantity>")]
pub async fn create_many(
    quantity: i64,
    pool: &State<PgPool>,
    services: &State<BulkServices>,
    cancel: RequestCancellation,
) -> ApiResult<AffectedRows> {
    validate_quantity(quantity, services.config.max_quantity)?;

    let customers = services
        .generator
        .spawn(move |generator| generator.generate(quantity))
        .await?;

    let mut context =
        CustomerContext::open(pool.inner(), services.config.command_timeout, cancel.token())
            .await?;
    context.add_range(customers);
    let written = context.save_changes(cancel.token()).await?;

    respond(AffectedRows::new(written))
}

/// Refresh up to `quantity` random customers through a temp table and one
/// set-based `UPDATE`.
#[put("/customers/bulk-update?<quantity>")]
pub async fn bulk_update_many(
    quantity: i64,
    pool: &State<PgPool>,
    services: &State<BulkServices>,
    cancel: RequestCancellation,
) -> ApiResult<AffectedRows> {
    validate_quantity(quantity, services.config.max_quantity)?;

    let customers = session::guarded(
        "load customers",
        services.config.command_timeout,
        cancel.token(),
        queries::fetch_random(pool.inner(), quantity),
    )
    .await?;

    let data = services
        .generator
        .spawn(move |generator| {
            let mut customers = customers;
            generator.refresh(&mut customers);
            stamp_all(&mut customers, EntryState::Modified, Utc::now());
            stage(&customers)
        })
        .await?;

    let report = services
        .updater
        .execute(&data, &Customer::SCHEMA, cancel.token())
        .await?;

    respond(AffectedRows::new(report.rows_affected))
}

/// Refresh up to `quantity` random customers row by row.
#[put("/customers/update-many?<quantity>")]
pub async fn update_many(
    quantity: i64,
    pool: &State<PgPool>,
    services: &State<BulkServices>,
    cancel: RequestCancellation,
) -> ApiResult<AffectedRows> {
    validate_quantity(quantity, services.config.max_quantity)?;

    let timeout = services.config.command_timeout;
    let mut context = CustomerContext::open(pool.inner(), timeout, cancel.token()).await?;
    let customers = session::guarded(
        "load customers",
        timeout,
        cancel.token(),
        queries::fetch_random(context.connection()?, quantity),
    )
    .await?;

    let customers = services
        .generator
        .spawn(move |generator| {
            let mut customers = customers;
            generator.refresh(&mut customers);
            Ok(customers)
        })
        .await?;

    context.update_range(customers);
    let written = context.save_changes(cancel.token()).await?;

    respond(AffectedRows::new(written))
}

#[put("/customers/<id>")]
pub async fn update_one(
    id: Uuid,
    pool: &State<PgPool>,
    services: &State<BulkServices>,
    cancel: RequestCancellation,
) -> ApiResult<AffectedRows> {
    let timeout = services.config.command_timeout;
    let mut context = CustomerContext::open(pool.inner(), timeout, cancel.token()).await?;
    let mut customer = session::guarded(
        "load customer",
        timeout,
        cancel.token(),
        queries::fetch_one(context.connection()?, id),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Customer {id} not found")))?;

    services.generator.refresh_one(&mut customer);
    context.update(customer);
    let written = context.save_changes(cancel.token()).await?;

    respond(AffectedRows::new(written))
}

#[post("/customers")]
pub async fn create_one(
    pool: &State<PgPool>,
    services: &State<BulkServices>,
    cancel: RequestCancellation,
) -> ApiResult<Customer> {
    let mut context =
        CustomerContext::open(pool.inner(), services.config.command_timeout, cancel.token())
            .await?;
    context.add(services.generator.one());
    context.save_changes(cancel.token()).await?;

    let customer = context
        .into_entities()
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::InternalError("saved customer went missing".into()))?;

    respond(customer)
}

#[get("/customers")]
pub async fn get_all(pool: &State<PgPool>) -> ApiResult<Vec<Customer>> {
    respond(queries::fetch_all(pool.inner()).await?)
}

#[get("/customers/<id>")]
pub async fn get_one(id: Uuid, pool: &State<PgPool>) -> ApiResult<Customer> {
    let customer = queries::fetch_one(pool.inner(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Customer {id} not found")))?;

    respond(customer)
}
