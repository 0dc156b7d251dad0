pub mod collector;
pub mod config;
pub mod db;
pub mod explorer;
pub mod gas;
pub mod models;
pub mod scheduler;
pub mod state;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use collector::{collect_metrics, CollectError};
pub use collector::bootstrap::{bootstrap_store, BootstrapError, BootstrapOutcome};
pub use collector::fetcher::{AddressCounterFetcher, FetchError, RetryPolicy};
pub use collector::snapshot::Snapshot;
pub use db::DeltaStore;
pub use explorer::ExplorerClient;
pub use models::{AddressCounters, AddressMetrics};
