#[macro_use]
extern crate rocket;

pub mod bulk;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod state;

use crate::bulk::BulkConfig;
use crate::db::CustomersDb;
use crate::request_logger::RequestLogger;
use crate::state::{BulkServices, ShutdownSignal};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use std::sync::Once;

static LOGGER: Once = Once::new();

pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let config = BulkConfig::from_env();
    log::info!(
        "bulk config: copy timeout {:?}, command timeout {:?}, batch {} rows, admin routes {}",
        config.copy_timeout,
        config.command_timeout,
        config.copy_batch_size,
        if config.enable_admin_routes { "on" } else { "off" }
    );

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Put, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    let services_config = config.clone();
    let mut rocket = rocket::build()
        .attach(RequestLogger)
        .attach(CustomersDb::init())
        .attach(cors)
        .manage(ShutdownSignal::new())
        .attach(AdHoc::try_on_ignite("Run Migrations", |rocket| async move {
            match CustomersDb::fetch(&rocket) {
                Some(pool) => match db::run_migrations(pool).await {
                    Ok(()) => Ok(rocket),
                    Err(e) => {
                        log::error!("database migrations failed: {}", e);
                        Err(rocket)
                    }
                },
                None => {
                    log::error!("database pool not available for migrations");
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::try_on_ignite(
            "Manage DB Pool and Bulk Services",
            move |rocket| async move {
                let Some(db) = CustomersDb::fetch(&rocket) else {
                    return Err(rocket);
                };
                let pool = (**db).clone();

                match BulkServices::new(pool.clone(), services_config) {
                    Ok(services) => Ok(rocket.manage(pool).manage(services)),
                    Err(e) => {
                        log::error!("failed to start bulk services: {}", e);
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::on_shutdown("Cancel In-Flight Writes", |rocket| {
            Box::pin(async move {
                if let Some(signal) = rocket.state::<ShutdownSignal>() {
                    log::info!("shutdown requested, cancelling in-flight writes");
                    signal.trigger();
                }
            })
        }))
        .mount("/api/v1", routes::api_routes());

    if config.enable_admin_routes {
        log::warn!("admin routes enabled: DELETE /api/v1/admin/customers is reachable");
        rocket = rocket.mount("/api/v1", routes::admin::routes());
    }

    rocket
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use crate::bulk::BulkConfig;
    use crate::state::{BulkServices, ShutdownSignal};
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::PgPool;

    pub use database::{TestDatabase, TestDatabaseError};

    pub mod database {
        use crate::db::MIGRATOR;
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::ImageExt;
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Disposable, migrated Postgres for one integration test.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Start a Postgres container and apply every migration.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                // gen_random_uuid() is built in from Postgres 13 on.
                let container = Postgres::default().with_tag("16-alpine").start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let connect_options: PgConnectOptions = url.parse()?;
                let connect_options = connect_options.log_statements(LevelFilter::Off);

                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect_with(connect_options)
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    container: Some(container),
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close the pool and stop the container.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }
                if let Some(container) = self.container.take() {
                    container.stop().await?;
                }
                Ok(())
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        pg_pool: Option<PgPool>,
        services: Option<BulkServices>,
        shutdown: Option<ShutdownSignal>,
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                ..Default::default()
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api/v1".to_string(), routes));
            self
        }

        /// Manage the pool plus bulk services built from `config`.
        pub fn manage_bulk_services(mut self, pool: PgPool, config: BulkConfig) -> Self {
            let services =
                BulkServices::new(pool.clone(), config).expect("bulk services start in tests");
            self.pg_pool = Some(pool);
            self.services = Some(services);
            self
        }

        /// Use a caller-held shutdown signal instead of a fresh one.
        pub fn shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
            self.shutdown = Some(signal);
            self
        }

        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment)
                .manage(self.shutdown.unwrap_or_default());

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }
            if let Some(services) = self.services {
                rocket = rocket.manage(services);
            }

            rocket
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
