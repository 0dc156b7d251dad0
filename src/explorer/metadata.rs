use crate::config::Network;
use crate::explorer::client::ExplorerError;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

pub fn metadata_url(base_url: &str, network: Network) -> String {
    format!("{}/{}/chains.json", base_url.trim_end_matches('/'), network)
}

/// Downloads the chain/app/contract topology published for `network`.
pub async fn download_metadata(
    http: &Client,
    base_url: &str,
    network: Network,
) -> Result<Value, ExplorerError> {
    let url = metadata_url(base_url, network);
    info!("Downloading network metadata from {}", url);

    let response = http.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ExplorerError::Status { status, url });
    }

    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_METADATA_BASE_URL;

    #[test]
    fn builds_github_metadata_url() {
        assert_eq!(
            metadata_url(DEFAULT_METADATA_BASE_URL, Network::Testnet),
            "https://raw.githubusercontent.com/skalenetwork/skale-network/master/metadata/testnet/chains.json"
        );
    }
}
