use crate::collector::collect_metrics;
use crate::db::today;
use crate::state::AppState;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A pass is due once per calendar day.
pub fn is_due(last_run: Option<NaiveDate>, current: NaiveDate) -> bool {
    last_run.map_or(true, |last| current > last)
}

/// Runs one collection pass per day until `shutdown` is cancelled.
///
/// After a successful pass (or when none is due) the loop sleeps for the
/// check interval; after a failed pass it sleeps for the shorter error
/// interval and tries again.
pub async fn run_daily(state: Arc<AppState>, shutdown: CancellationToken) {
    let network = state.config.network;
    info!("Starting metrics collection loop for network: {}", network);

    let mut last_run: Option<NaiveDate> = None;

    loop {
        let current = today();

        let pause = if is_due(last_run, current) {
            info!("Daily metrics collection started for {}...", network);
            match collect_metrics(&state).await {
                Ok(snapshot) => {
                    last_run = Some(current);
                    info!(
                        "Daily metrics collection completed for {} ({} chains)",
                        network,
                        snapshot.metrics.len()
                    );
                    state.config.metrics_check_interval
                }
                Err(e) => {
                    error!("Error during metrics collection for {}: {}", network, e);
                    state.config.metrics_error_check_interval
                }
            }
        } else {
            debug!(
                "Not time for collection yet. Last run: {:?}, current date: {}",
                last_run, current
            );
            state.config.metrics_check_interval
        };

        debug!("Sleeping for {:?}", pause);
        tokio::select! {
            _ = sleep(pause) => {}
            _ = shutdown.cancelled() => {
                info!("Shutting down metrics collection loop");
                break;
            }
        }
    }
}
