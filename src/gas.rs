//! Average base fee over sampled blocks, read from an Ethereum JSON-RPC node.

use crate::config::Config;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

const WEI_PER_GWEI: u128 = 1_000_000_000;

#[derive(Error, Debug)]
pub enum GasError {
    #[error("RPC request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("RPC error from {method}: {message}")]
    Rpc { method: &'static str, message: String },

    #[error("Empty RPC result from {0}")]
    EmptyResult(&'static str),

    #[error("Invalid hex quantity: {0}")]
    InvalidQuantity(String),

    #[error("Block {0} has no baseFeePerGas")]
    MissingBaseFee(u64),

    #[error("No blocks available to sample")]
    NoBlocks,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Block {
    base_fee_per_gas: Option<String>,
}

fn parse_quantity(value: &str) -> Result<u128, GasError> {
    let digits = value.trim_start_matches("0x");
    u128::from_str_radix(digits, 16).map_err(|_| GasError::InvalidQuantity(value.to_string()))
}

/// Block `index` steps of `block_sampling` back from `latest`, or `None` once
/// that would go below genesis.
fn sampled_block(latest: u64, block_sampling: u64, index: u64) -> Option<u64> {
    block_sampling
        .checked_mul(index)
        .and_then(|offset| latest.checked_sub(offset))
}

#[derive(Clone)]
pub struct GasEstimator {
    http: Client,
    endpoint: String,
    iterations: u64,
    block_sampling: u64,
}

impl GasEstimator {
    pub fn new(http: Client, endpoint: String, iterations: u64, block_sampling: u64) -> Self {
        Self {
            http,
            endpoint,
            iterations,
            block_sampling,
        }
    }

    pub fn from_config(http: Client, config: &Config) -> Self {
        Self::new(
            http,
            config.eth_endpoint.clone(),
            config.gas_estimation_iterations,
            config.block_sampling,
        )
    }

    async fn call<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> Result<T, GasError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: RpcResponse<T> = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(GasError::Rpc {
                method,
                message: error.message,
            });
        }
        response.result.ok_or(GasError::EmptyResult(method))
    }

    async fn base_fee(&self, block_number: u64) -> Result<u128, GasError> {
        let block: Block = self
            .call("eth_getBlockByNumber", json!([format!("0x{:x}", block_number), false]))
            .await?;
        let fee = block.base_fee_per_gas.ok_or(GasError::MissingBaseFee(block_number))?;
        parse_quantity(&fee)
    }

    /// Mean `baseFeePerGas` in gwei (truncated) over the latest block and
    /// every `block_sampling`-th block before it, `iterations` blocks total.
    pub async fn average_gas_price_gwei(&self) -> Result<u64, GasError> {
        let latest: String = self.call("eth_blockNumber", json!([])).await?;
        let latest = parse_quantity(&latest)? as u64;
        info!(
            "Calculating average gas price for the last {} blocks",
            self.iterations.saturating_mul(self.block_sampling)
        );

        let mut total: u128 = 0;
        let mut sampled: u128 = 0;
        for index in 0..self.iterations {
            let Some(block_number) = sampled_block(latest, self.block_sampling, index) else {
                break;
            };
            total += self.base_fee(block_number).await?;
            sampled += 1;
        }

        if sampled == 0 {
            return Err(GasError::NoBlocks);
        }

        let gwei = (total / sampled / WEI_PER_GWEI) as u64;
        info!("Average gas price: {} gwei", gwei);
        Ok(gwei)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x4a817c800").unwrap(), 20_000_000_000);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert!(matches!(parse_quantity("0xzz"), Err(GasError::InvalidQuantity(_))));
    }

    #[test]
    fn sampled_blocks_stop_at_genesis_and_overflow() {
        assert_eq!(sampled_block(100, 40, 0), Some(100));
        assert_eq!(sampled_block(100, 40, 2), Some(20));
        assert_eq!(sampled_block(100, 40, 3), None);
        assert_eq!(sampled_block(100, u64::MAX, 0), Some(100));
        assert_eq!(sampled_block(100, u64::MAX, 2), None);
    }
}
