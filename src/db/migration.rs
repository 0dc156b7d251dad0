use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // Create addresses table if not exists
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS addresses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chain_name TEXT NOT NULL,
            address TEXT NOT NULL,
            app_name TEXT NOT NULL,
            UNIQUE (chain_name, address, app_name)
        )"
    )
    .execute(pool)
    .await?;

    // Create transaction_counts table if not exists
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transaction_counts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            total_transactions INTEGER NOT NULL,
            daily_transactions INTEGER NOT NULL,
            UNIQUE (address_id, date),
            FOREIGN KEY (address_id) REFERENCES addresses(id)
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_addresses_address
         ON addresses(address)"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
