use crate::db::{today, DeltaStore};
use crate::explorer::{CounterResponse, ExplorerClient, ExplorerError};
use crate::models::{AddressCounters, AddressMetrics};
use backon::{ConstantBuilder, Retryable};
use chrono::{Duration as Days, NaiveDate};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch counters for {address} on {chain_name} after {attempts} attempts: {source}")]
    RetriesExhausted {
        chain_name: String,
        address: String,
        attempts: usize,
        #[source]
        source: ExplorerError,
    },

    #[error("Invalid transactions_count {value:?} for {address}")]
    InvalidCounter { address: String, value: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fixed-delay retry budget for counter requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.attempts.saturating_sub(1))
    }
}

/// Raw counters for one address, retrying transient failures.
/// An address the explorer does not know yields [`AddressCounters::empty`]
/// on the first attempt.
pub async fn fetch_counters(
    explorer: &ExplorerClient,
    chain_name: &str,
    address: &str,
    policy: RetryPolicy,
) -> Result<AddressCounters, FetchError> {
    let response = (move || async move { explorer.address_counters(chain_name, address).await })
        .retry(policy.backoff())
        .notify(|err: &ExplorerError, delay: Duration| {
            warn!(
                "Counters request for {} on {} failed: {}. Retrying in {:?}",
                address, chain_name, err, delay
            );
        })
        .await
        .map_err(|source| FetchError::RetriesExhausted {
            chain_name: chain_name.to_string(),
            address: address.to_string(),
            attempts: policy.attempts.max(1),
            source,
        })?;

    Ok(match response {
        CounterResponse::Found(counters) => counters,
        CounterResponse::NotFound => {
            debug!("Using empty counters for {} on {}", address, chain_name);
            AddressCounters::empty()
        }
    })
}

/// Cumulative transaction count carried by the counters.
pub fn total_transactions(counters: &AddressCounters, address: &str) -> Result<i64, FetchError> {
    counters
        .transactions_count
        .trim()
        .parse()
        .map_err(|_| FetchError::InvalidCounter {
            address: address.to_string(),
            value: counters.transactions_count.clone(),
        })
}

/// Fetches counters, records them in the store and attaches windowed sums.
pub struct AddressCounterFetcher<'a> {
    explorer: &'a ExplorerClient,
    store: &'a DeltaStore,
    policy: RetryPolicy,
}

impl<'a> AddressCounterFetcher<'a> {
    pub fn new(explorer: &'a ExplorerClient, store: &'a DeltaStore, policy: RetryPolicy) -> Self {
        Self {
            explorer,
            store,
            policy,
        }
    }

    pub async fn fetch(
        &self,
        chain_name: &str,
        app_name: &str,
        address: &str,
    ) -> Result<AddressMetrics, FetchError> {
        self.fetch_on(chain_name, app_name, address, today()).await
    }

    pub async fn fetch_on(
        &self,
        chain_name: &str,
        app_name: &str,
        address: &str,
        day: NaiveDate,
    ) -> Result<AddressMetrics, FetchError> {
        let counters = fetch_counters(self.explorer, chain_name, address, self.policy).await?;
        let total = total_transactions(&counters, address)?;

        self.store
            .update_on(chain_name, app_name, address, total, day)
            .await?;

        Ok(AddressMetrics {
            counters,
            transactions_today: self.trailing_sum(chain_name, app_name, address, day, 1).await?,
            transactions_last_7_days: self.trailing_sum(chain_name, app_name, address, day, 7).await?,
            transactions_last_30_days: self.trailing_sum(chain_name, app_name, address, day, 30).await?,
        })
    }

    /// Sum over the `days` calendar days ending with `day`.
    async fn trailing_sum(
        &self,
        chain_name: &str,
        app_name: &str,
        address: &str,
        day: NaiveDate,
        days: i64,
    ) -> Result<i64, sqlx::Error> {
        let start = day - Days::days(days - 1);
        self.store
            .windowed_sum(chain_name, app_name, address, start, day)
            .await
    }
}
