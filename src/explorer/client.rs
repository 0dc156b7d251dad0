use crate::config::{Config, Network};
use crate::models::AddressCounters;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Body message the explorer sends with a 404 for an address it has never seen.
pub const NOT_FOUND_MESSAGE: &str = "Not found";

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },
}

/// Outcome of a counters lookup that reached the explorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterResponse {
    Found(AddressCounters),
    NotFound,
}

/// Where explorer requests go.
#[derive(Debug, Clone)]
pub enum ExplorerEndpoint {
    /// `https://{chain}.{explorer host}` for each chain of the network.
    Network(Network),
    /// One base URL for every chain.
    Fixed(String),
}

impl ExplorerEndpoint {
    pub fn base_url(&self, chain_name: &str) -> String {
        match self {
            ExplorerEndpoint::Network(network) => {
                format!("https://{}.{}", chain_name, network.explorer_host())
            }
            ExplorerEndpoint::Fixed(url) => url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ExplorerClient {
    http: Client,
    endpoint: ExplorerEndpoint,
}

impl ExplorerClient {
    pub fn new(http: Client, endpoint: ExplorerEndpoint) -> Self {
        Self { http, endpoint }
    }

    pub fn from_config(http: Client, config: &Config) -> Self {
        let endpoint = match &config.explorer_url {
            Some(url) => ExplorerEndpoint::Fixed(url.clone()),
            None => ExplorerEndpoint::Network(config.network),
        };
        Self::new(http, endpoint)
    }

    pub fn stats_url(&self, chain_name: &str) -> String {
        format!("{}/api/v2/stats", self.endpoint.base_url(chain_name))
    }

    pub fn address_counters_url(&self, chain_name: &str, address: &str) -> String {
        format!(
            "{}/api/v2/addresses/{}/counters",
            self.endpoint.base_url(chain_name),
            address
        )
    }

    /// Chain-level statistics, passed through untouched.
    pub async fn chain_stats(&self, chain_name: &str) -> Result<Value, ExplorerError> {
        let url = self.stats_url(chain_name);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExplorerError::Status { status, url });
        }

        Ok(response.json().await?)
    }

    /// Counters for one address. A 404 carrying the explorer's "Not found"
    /// message is reported as [`CounterResponse::NotFound`]; every other
    /// failure is an error the caller may retry.
    pub async fn address_counters(
        &self,
        chain_name: &str,
        address: &str,
    ) -> Result<CounterResponse, ExplorerError> {
        let url = self.address_counters_url(chain_name, address);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            if body.get("message").and_then(Value::as_str) == Some(NOT_FOUND_MESSAGE) {
                debug!("Address {} not found on {}", address, chain_name);
                return Ok(CounterResponse::NotFound);
            }
            return Err(ExplorerError::Status { status, url });
        }
        if !status.is_success() {
            return Err(ExplorerError::Status { status, url });
        }

        Ok(CounterResponse::Found(response.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_per_chain_urls() {
        let client = ExplorerClient::new(Client::new(), ExplorerEndpoint::Network(Network::Mainnet));

        assert_eq!(
            client.stats_url("elated-tan-skat"),
            "https://elated-tan-skat.explorer.mainnet.skalenodes.com/api/v2/stats"
        );
        assert_eq!(
            client.address_counters_url("elated-tan-skat", "0xAAA"),
            "https://elated-tan-skat.explorer.mainnet.skalenodes.com/api/v2/addresses/0xAAA/counters"
        );
    }

    #[test]
    fn fixed_endpoint_ignores_chain() {
        let endpoint = ExplorerEndpoint::Fixed("http://127.0.0.1:9000/".to_string());
        assert_eq!(endpoint.base_url("any-chain"), "http://127.0.0.1:9000");
    }
}
