//! One-time backfill of a flat history for every known address, so the first
//! live pass computes its delta against the current total instead of zero.

use crate::collector::fetcher::{fetch_counters, total_transactions, FetchError};
use crate::collector::topology::{Topology, TopologyError};
use crate::db::{today, BaselineEntry};
use crate::explorer::{download_metadata, ExplorerError};
use crate::state::AppState;
use chrono::NaiveDate;
use futures::future::try_join_all;
use thiserror::Error;
use tracing::info;

/// Days of flat history written per address.
pub const BASELINE_DAYS: i64 = 30;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Failed to download network metadata: {0}")]
    Metadata(#[source] ExplorerError),

    #[error("Invalid network metadata: {0}")]
    Topology(#[from] TopologyError),

    #[error("Failed to fetch baseline counters: {0}")]
    Fetch(#[from] FetchError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The store already had addresses; nothing was touched.
    Skipped { existing: i64 },
    Seeded { addresses: usize, rows: usize },
}

pub async fn bootstrap_store(state: &AppState) -> Result<BootstrapOutcome, BootstrapError> {
    bootstrap_store_on(state, today()).await
}

pub async fn bootstrap_store_on(
    state: &AppState,
    day: NaiveDate,
) -> Result<BootstrapOutcome, BootstrapError> {
    info!("Checking if database needs bootstrapping...");

    let existing = state.store.address_count().await?;
    if existing > 0 {
        info!("Database holds {} addresses, skipping bootstrap", existing);
        return Ok(BootstrapOutcome::Skipped { existing });
    }

    let config = &state.config;
    let metadata = download_metadata(&state.http, &config.metadata_base_url, config.network)
        .await
        .map_err(BootstrapError::Metadata)?;
    let targets = Topology::from_metadata(&metadata)?.targets();

    let policy = state.retry_policy();
    let entries = try_join_all(targets.iter().map(|target| async move {
        let counters = fetch_counters(&state.explorer, &target.chain_name, &target.address, policy).await?;
        Ok::<_, FetchError>(BaselineEntry {
            chain_name: target.chain_name.clone(),
            app_name: target.app_name.clone(),
            address: target.address.clone(),
            total_transactions: total_transactions(&counters, &target.address)?,
        })
    }))
    .await?;

    let rows = state.store.seed_baseline(&entries, day, BASELINE_DAYS).await?;
    info!(
        "Bootstrapped {} addresses with {} days of history ({} rows)",
        entries.len(),
        BASELINE_DAYS,
        rows
    );

    Ok(BootstrapOutcome::Seeded {
        addresses: entries.len(),
        rows,
    })
}
