//! Expands network metadata into the chains, apps and addresses to poll.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Metadata key for the off-chain aggregate entry; it has no explorer.
pub const OFFCHAIN_KEY: &str = "__offchain";

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Network metadata is not a JSON object")]
    NotAnObject,

    #[error("Invalid metadata for chain {chain}: {source}")]
    InvalidChain {
        chain: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RawChain {
    apps: Option<BTreeMap<String, RawApp>>,
}

#[derive(Deserialize)]
struct RawApp {
    contracts: Option<Vec<String>>,
}

/// Apps of one chain that declare contracts, keyed by app name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainTopology {
    pub apps: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub chains: BTreeMap<String, ChainTopology>,
}

/// A single address to fetch counters for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTarget {
    pub chain_name: String,
    pub app_name: String,
    pub address: String,
}

impl Topology {
    /// Parses `chains.json`. The off-chain entry is skipped without looking
    /// at its shape; apps without a `contracts` list are dropped. Chains
    /// without apps stay, with no apps.
    pub fn from_metadata(metadata: &Value) -> Result<Self, TopologyError> {
        let entries = metadata.as_object().ok_or(TopologyError::NotAnObject)?;

        let mut chains = BTreeMap::new();
        for (chain_name, chain_info) in entries {
            if chain_name == OFFCHAIN_KEY {
                continue;
            }

            let raw = RawChain::deserialize(chain_info).map_err(|source| TopologyError::InvalidChain {
                chain: chain_name.clone(),
                source,
            })?;

            let apps = raw
                .apps
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(app_name, app)| app.contracts.map(|contracts| (app_name, contracts)))
                .collect();

            chains.insert(chain_name.clone(), ChainTopology { apps });
        }

        Ok(Self { chains })
    }

    pub fn targets(&self) -> Vec<FetchTarget> {
        self.chains
            .iter()
            .flat_map(|(chain_name, chain)| {
                chain.apps.iter().flat_map(move |(app_name, contracts)| {
                    contracts.iter().map(move |address| FetchTarget {
                        chain_name: chain_name.clone(),
                        app_name: app_name.clone(),
                        address: address.clone(),
                    })
                })
            })
            .collect()
    }
}
