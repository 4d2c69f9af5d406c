use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use customer_bulk_api::context::queries;

#[derive(Parser, Debug)]
#[command(
    name = "purge_customers",
    about = "Truncate the customers table of a customer bulk API database"
)]
struct Args {
    /// Connection string; falls back to DATABASE_URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Confirm that every customer row should be removed.
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    if !args.yes {
        writeln!(
            io::stderr(),
            "error: refusing to truncate customers without --yes"
        )?;
        std::process::exit(1);
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&args.database_url)
        .await?;

    let mut conn = pool.acquire().await?;
    let removed = queries::truncate(&mut conn).await?;

    println!("Removed {removed} customers.");

    pool.close().await;
    Ok(())
}
