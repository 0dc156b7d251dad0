use crate::models::AddressMetrics;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Address -> counters for one app.
pub type AppCounters = BTreeMap<String, AddressMetrics>;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainMetrics {
    pub apps_counters: BTreeMap<String, AppCounters>,
    /// Explorer stats as returned upstream; `None` when they could not be fetched.
    pub chain_stats: Option<Value>,
}

/// The published document: every chain's stats and app counters, the
/// average gas price and the unix time of the pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub gas: u64,
    pub last_updated: i64,
    pub metrics: BTreeMap<String, ChainMetrics>,
}

impl Snapshot {
    /// Pretty JSON with 4-space indentation and keys sorted at every level.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        // Going through Value sorts keys, upstream chain stats included.
        let value = serde_json::to_value(self)?;

        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        value.serialize(&mut ser)?;
        Ok(buf)
    }

    /// Replaces the file at `path`. The document is written next to it first
    /// and renamed into place.
    pub async fn write_to(&self, path: &Path) -> Result<(), SnapshotError> {
        let bytes = self.to_json()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        Ok(())
    }

    #[cfg(test)]
    pub async fn read_from(path: &Path) -> Result<Self, SnapshotError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
