//! Delta store: per-address daily transaction history in SQLite.
//!
//! Cumulative counters reported by the explorer are turned into per-day
//! deltas on write, and windowed statistics are sums over those deltas.

pub mod address;
pub mod connection;
pub mod migration;
pub mod transaction;

use crate::config::Config;
use crate::models::{Address, TransactionCount};
use chrono::{Duration, Local, NaiveDate};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Calendar day on the process-local clock.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// One address's flat starting point for the backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineEntry {
    pub chain_name: String,
    pub app_name: String,
    pub address: String,
    pub total_transactions: i64,
}

/// Owns the pool; every mutation goes through here.
#[derive(Clone)]
pub struct DeltaStore {
    pool: SqlitePool,
}

impl DeltaStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        Ok(Self::new(connection::establish_connection(config).await?))
    }

    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        Ok(Self::new(connection::in_memory().await?))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn get_or_create_address(
        &self,
        chain_name: &str,
        address: &str,
        app_name: &str,
    ) -> Result<Address, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        address::get_or_create(&mut conn, chain_name, address, app_name).await
    }

    pub async fn update(
        &self,
        chain_name: &str,
        app_name: &str,
        address: &str,
        total_transactions: i64,
    ) -> Result<TransactionCount, sqlx::Error> {
        self.update_on(chain_name, app_name, address, total_transactions, today())
            .await
    }

    /// Records `total_transactions` as the cumulative count observed on `day`.
    ///
    /// History is keyed by the address value alone: the first `(chain, app)`
    /// that reports an address owns its row, and later listings of the same
    /// address under another app share that history.
    ///
    /// The delta is taken against the highest total stored for any earlier
    /// day, so repeating the call for the same day recomputes the same value
    /// and a later call with a different total replaces the earlier one.
    /// Deltas are stored as computed, negative ones included.
    pub async fn update_on(
        &self,
        chain_name: &str,
        app_name: &str,
        address: &str,
        total_transactions: i64,
        day: NaiveDate,
    ) -> Result<TransactionCount, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let addr = address::resolve(&mut tx, chain_name, address, app_name).await?;
        let previous = transaction::previous_max_total(&mut tx, addr.id, day).await?;

        let row = TransactionCount {
            address_id: addr.id,
            date: day,
            total_transactions,
            daily_transactions: total_transactions - previous,
        };
        transaction::upsert(&mut tx, &row).await?;

        tx.commit().await?;

        info!(
            "Updated transaction count for {} on {}: total={}, daily={}",
            address, day, row.total_transactions, row.daily_transactions
        );
        Ok(row)
    }

    /// Sum of daily deltas over `[start, end]`, both ends inclusive.
    /// The address is resolved the same way as in [`DeltaStore::update_on`];
    /// one that was never observed is created and sums to 0.
    pub async fn windowed_sum(
        &self,
        chain_name: &str,
        app_name: &str,
        address: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        let addr = address::resolve(&mut conn, chain_name, address, app_name).await?;
        transaction::sum_daily(&mut conn, addr.id, start, end).await
    }

    pub async fn address_count(&self) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        address::count(&mut conn).await
    }

    /// Writes `days` rows per entry, ending the day before `today`, each
    /// carrying the entry's total and a zero delta. Everything happens in one
    /// transaction; rows that already exist are left alone.
    ///
    /// Returns the number of rows written.
    pub async fn seed_baseline(
        &self,
        entries: &[BaselineEntry],
        today: NaiveDate,
        days: i64,
    ) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for entry in entries {
            let addr = address::resolve(
                &mut tx,
                &entry.chain_name,
                &entry.address,
                &entry.app_name,
            )
            .await?;

            for offset in 1..=days {
                let row = TransactionCount {
                    address_id: addr.id,
                    date: today - Duration::days(offset),
                    total_transactions: entry.total_transactions,
                    daily_transactions: 0,
                };
                if transaction::insert_if_absent(&mut tx, &row).await? {
                    written += 1;
                } else {
                    debug!("Transaction record for {} on {} already exists", entry.address, row.date);
                }
            }
        }

        tx.commit().await?;
        Ok(written)
    }

    /// All rows for an address in date order; empty if the address is unknown.
    pub async fn history(&self, address: &str) -> Result<Vec<TransactionCount>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        match address::find_by_address(&mut conn, address).await? {
            Some(addr) => transaction::history(&mut conn, addr.id).await,
            None => Ok(Vec::new()),
        }
    }
}
