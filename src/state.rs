use crate::collector::fetcher::RetryPolicy;
use crate::config::Config;
use crate::db::DeltaStore;
use crate::explorer::ExplorerClient;
use crate::gas::GasEstimator;
use reqwest::Client;

pub struct AppState {
    pub config: Config,
    pub http: Client,
    pub store: DeltaStore,
    pub explorer: ExplorerClient,
    pub gas: GasEstimator,
}

impl AppState {
    pub fn new(config: Config, store: DeltaStore) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        let explorer = ExplorerClient::from_config(http.clone(), &config);
        let gas = GasEstimator::from_config(http.clone(), &config);

        Ok(Self {
            config,
            http,
            store,
            explorer,
            gas,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.config.api_error_retries,
            delay: self.config.api_error_timeout,
        }
    }
}
