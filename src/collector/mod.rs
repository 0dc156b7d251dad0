//! One collection pass: metadata, chain stats, per-address counters, snapshot.
//!
//! Chains, apps within a chain and addresses within an app are all fetched
//! concurrently. Each level waits for every branch before assembling, so a
//! failing address never interrupts its siblings, but any failed address
//! drops its whole app from the snapshot for this pass.

pub mod bootstrap;
pub mod fetcher;
pub mod snapshot;
pub mod topology;

use crate::db::today;
use crate::explorer::{download_metadata, ExplorerError};
use crate::gas::GasError;
use crate::state::AppState;
use chrono::{NaiveDate, Utc};
use fetcher::{AddressCounterFetcher, FetchError};
use futures::future::join_all;
use snapshot::{AppCounters, ChainMetrics, Snapshot, SnapshotError};
use std::collections::BTreeMap;
use thiserror::Error;
use topology::{ChainTopology, Topology, TopologyError};
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Failed to download network metadata: {0}")]
    Metadata(#[source] ExplorerError),

    #[error("Invalid network metadata: {0}")]
    Topology(#[from] TopologyError),

    #[error("Gas estimation failed: {0}")]
    Gas(#[from] GasError),

    #[error("Failed to save metrics: {0}")]
    Snapshot(#[from] SnapshotError),
}

pub async fn collect_metrics(state: &AppState) -> Result<Snapshot, CollectError> {
    collect_metrics_on(state, today()).await
}

/// Runs a full pass with `day` as the current date and overwrites the
/// snapshot file. Nothing is written if the metadata, gas price or snapshot
/// step fails.
pub async fn collect_metrics_on(state: &AppState, day: NaiveDate) -> Result<Snapshot, CollectError> {
    let config = &state.config;

    let metadata = download_metadata(&state.http, &config.metadata_base_url, config.network)
        .await
        .map_err(CollectError::Metadata)?;
    let topology = Topology::from_metadata(&metadata)?;

    let fetcher = AddressCounterFetcher::new(&state.explorer, &state.store, state.retry_policy());
    let chains = join_all(
        topology
            .chains
            .iter()
            .map(|(chain_name, chain)| collect_chain(state, &fetcher, chain_name, chain, day)),
    )
    .await;

    let gas = state.gas.average_gas_price_gwei().await?;

    let snapshot = Snapshot {
        gas,
        last_updated: Utc::now().timestamp(),
        metrics: chains.into_iter().collect(),
    };

    info!("Saving metrics to {}", config.metrics_filepath.display());
    snapshot.write_to(&config.metrics_filepath).await?;

    Ok(snapshot)
}

async fn collect_chain(
    state: &AppState,
    fetcher: &AddressCounterFetcher<'_>,
    chain_name: &str,
    chain: &ChainTopology,
    day: NaiveDate,
) -> (String, ChainMetrics) {
    let stats = async {
        match state.explorer.chain_stats(chain_name).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!("Failed to get chain stats for {}: {}", chain_name, e);
                None
            }
        }
    };
    let apps = join_all(
        chain
            .apps
            .iter()
            .map(|(app_name, contracts)| collect_app(fetcher, chain_name, app_name, contracts, day)),
    );

    let (chain_stats, apps) = futures::join!(stats, apps);

    let mut apps_counters = BTreeMap::new();
    for (app_name, result) in apps {
        match result {
            Ok(counters) => {
                apps_counters.insert(app_name, counters);
            }
            Err(e) => error!(
                "Failed to collect counters for app {} on {}: {}",
                app_name, chain_name, e
            ),
        }
    }

    (
        chain_name.to_string(),
        ChainMetrics {
            apps_counters,
            chain_stats,
        },
    )
}

async fn collect_app(
    fetcher: &AddressCounterFetcher<'_>,
    chain_name: &str,
    app_name: &str,
    contracts: &[String],
    day: NaiveDate,
) -> (String, Result<AppCounters, FetchError>) {
    info!("Fetching counters for app {}", app_name);

    let results = join_all(
        contracts
            .iter()
            .map(|address| fetcher.fetch_on(chain_name, app_name, address, day)),
    )
    .await;

    // First failure, if any, fails the app.
    let counters = contracts
        .iter()
        .cloned()
        .zip(results)
        .map(|(address, result)| result.map(|metrics| (address, metrics)))
        .collect();

    (app_name.to_string(), counters)
}
