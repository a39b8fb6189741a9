use anyhow::Context;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use tracing::log::LevelFilter;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens the pool and brings the `videos` schema up to date.
pub async fn connect_and_migrate(connection_string: &str) -> anyhow::Result<PgPool> {
    let options = PgConnectOptions::from_str(connection_string)
        .context("Invalid DATABASE_URL")?
        .log_statements(LevelFilter::Debug);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect_with(options)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!("✅ Connected to PostgreSQL");

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;
    info!("✅ {} migration(s) known, schema up to date", MIGRATOR.iter().count());

    Ok(pool)
}
