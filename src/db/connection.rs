// SQLite connection pool setup.
// Waits for the database to become reachable, then applies the schema.

use crate::config::Config;
use crate::db::migration::run_migrations;
use backon::{ConstantBuilder, Retryable};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub async fn establish_connection(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        // Enable WAL mode for better concurrency
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);
    let options = &options;
    let max_connections = config.db_max_connections;

    let backoff = ConstantBuilder::default()
        .with_delay(config.db_connection_interval)
        .with_max_times(config.db_connection_retries);

    let pool = (move || async move {
        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options.clone())
            .await
    })
    .retry(backoff)
    .notify(|err: &sqlx::Error, delay: Duration| {
        warn!("Database connection failed: {}. Retrying in {:?}", err, delay);
    })
    .await?;

    // Run a simple query to ensure the database is reachable
    sqlx::query("SELECT 1").execute(&pool).await?;
    info!("Successfully connected to the database");

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied.
///
/// The pool is capped at one connection that never expires, since every new
/// `:memory:` connection would otherwise open a fresh, empty database.
pub async fn in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}
