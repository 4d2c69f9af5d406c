use rocket_db_pools::sqlx::migrate::{MigrateError, Migrator};
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_db_pools::Database;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Database)]
#[database("customers_db")]
pub struct CustomersDb(sqlx::PgPool);

/// Bring the schema up to date before serving traffic.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    log::info!("checking database migration state");
    MIGRATOR.run(pool).await?;
    log::info!("database migrations up to date");
    Ok(())
}
