// Configuration structure for:
// - Network name and explorer endpoints
// - Database connection string and pool settings
// - Upstream retry policy
// - Collection intervals and output path

use dotenv::dotenv;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_METADATA_BASE_URL: &str =
    "https://raw.githubusercontent.com/skalenetwork/skale-network/master/metadata";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Missing required environment variable: {0}")]
    MissingVariable(&'static str),
}

/// Networks with a known explorer deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Legacy,
    Regression,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Legacy => "legacy",
            Network::Regression => "regression",
            Network::Testnet => "testnet",
        }
    }

    /// Host that per-chain explorer subdomains hang off.
    pub fn explorer_host(&self) -> &'static str {
        match self {
            Network::Mainnet => "explorer.mainnet.skalenodes.com",
            Network::Legacy => "legacy-explorer.skalenodes.com",
            Network::Regression => "regression-explorer.skalenodes.com",
            Network::Testnet => "explorer.testnet.skalenodes.com",
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "legacy" => Ok(Network::Legacy),
            "regression" => Ok(Network::Regression),
            "testnet" => Ok(Network::Testnet),
            other => Err(ConfigError::UnsupportedNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connection_retries: usize,
    pub db_connection_interval: Duration,
    pub metadata_base_url: String,
    pub explorer_url: Option<String>,
    pub eth_endpoint: String,
    pub metrics_filepath: PathBuf,
    pub api_error_retries: usize,
    pub api_error_timeout: Duration,
    pub metrics_check_interval: Duration,
    pub metrics_error_check_interval: Duration,
    pub gas_estimation_iterations: u64,
    pub block_sampling: u64,
    pub http_timeout: Duration,
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn secs_or(key: &str, default: u64) -> Duration {
    Duration::from_secs(parse_or(key, default))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let network = env::var("NETWORK_NAME")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "mainnet".to_string())
            .parse()?;
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:metrics.db".to_string());
        let metadata_base_url = env::var("METADATA_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_METADATA_BASE_URL.to_string());
        let explorer_url = env::var("EXPLORER_URL").ok().filter(|v| !v.is_empty());
        let eth_endpoint = env::var("ETH_ENDPOINT")
            .map_err(|_| ConfigError::MissingVariable("ETH_ENDPOINT"))?;
        let metrics_filepath = env::var("METRICS_FILEPATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("www/metrics.json"));

        Ok(Self {
            network,
            database_url,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 8),
            db_connection_retries: parse_or("DB_CONNECTION_RETRIES", 10),
            db_connection_interval: secs_or("DB_CONNECTION_INTERVAL", 5),
            metadata_base_url,
            explorer_url,
            eth_endpoint,
            metrics_filepath,
            api_error_retries: parse_or("API_ERROR_RETRIES", 3),
            api_error_timeout: secs_or("API_ERROR_TIMEOUT", 2),
            metrics_check_interval: secs_or("METRICS_CHECK_INTERVAL", 300),
            metrics_error_check_interval: secs_or("METRICS_ERROR_CHECK_INTERVAL", 30),
            gas_estimation_iterations: parse_or("GAS_ESTIMATION_ITERATIONS", 1),
            block_sampling: parse_or("BLOCK_SAMPLING", 100),
            http_timeout: secs_or("HTTP_TIMEOUT_SECS", 30),
        })
    }
}
