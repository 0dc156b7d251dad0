pub mod client;
pub mod metadata;

// Re-exports for convenience
pub use client::{CounterResponse, ExplorerClient, ExplorerEndpoint, ExplorerError};
pub use metadata::download_metadata;
