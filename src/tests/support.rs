//! Mock upstreams for tests: metadata, explorer API and JSON-RPC on one
//! ephemeral local port.

use crate::config::{Config, Network};
use crate::db::DeltaStore;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_RETRY_DELAY: Duration = Duration::from_millis(10);

/// 20 gwei
pub const BASE_FEE_HEX: &str = "0x4a817c800";

#[derive(Default)]
struct MockData {
    metadata: Option<Value>,
    chain_stats: Option<Value>,
    counters: HashMap<String, Value>,
    failures: HashMap<String, usize>,
    requests: HashMap<String, usize>,
    bare_not_found: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct MockExplorer {
    data: Arc<Mutex<MockData>>,
}

impl MockExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_metadata(&self, metadata: Value) {
        self.data.lock().unwrap().metadata = Some(metadata);
    }

    /// Metadata requests fail with 500 from now on.
    pub fn clear_metadata(&self) {
        self.data.lock().unwrap().metadata = None;
    }

    /// `None` makes the stats endpoint fail with 500.
    pub fn set_chain_stats(&self, stats: Option<Value>) {
        self.data.lock().unwrap().chain_stats = stats;
    }

    pub fn set_transactions(&self, address: &str, transactions: i64) {
        self.set_counters(
            address,
            json!({
                "gas_usage_count": "16935",
                "token_transfers_count": "174",
                "transactions_count": transactions.to_string(),
                "validations_count": "22"
            }),
        );
    }

    pub fn set_counters(&self, address: &str, counters: Value) {
        self.data
            .lock()
            .unwrap()
            .counters
            .insert(address.to_string(), counters);
    }

    /// The next `times` counter requests for `address` fail with 500.
    pub fn fail_next(&self, address: &str, times: usize) {
        self.data
            .lock()
            .unwrap()
            .failures
            .insert(address.to_string(), times);
    }

    /// Counter requests for `address` get a 404 without the explorer's message.
    pub fn bare_not_found(&self, address: &str) {
        self.data
            .lock()
            .unwrap()
            .bare_not_found
            .insert(address.to_string());
    }

    pub fn requests(&self, address: &str) -> usize {
        self.data
            .lock()
            .unwrap()
            .requests
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Serves the mock and returns its base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/{network}/chains.json", get(metadata))
            .route("/api/v2/stats", get(chain_stats))
            .route("/api/v2/addresses/{address}/counters", get(address_counters))
            .route("/rpc", post(rpc))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }
}

async fn metadata(State(mock): State<MockExplorer>, Path(_network): Path<String>) -> Response {
    match mock.data.lock().unwrap().metadata.clone() {
        Some(metadata) => Json(metadata).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn chain_stats(State(mock): State<MockExplorer>) -> Response {
    match mock.data.lock().unwrap().chain_stats.clone() {
        Some(stats) => Json(stats).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn address_counters(
    State(mock): State<MockExplorer>,
    Path(address): Path<String>,
) -> Response {
    let mut data = mock.data.lock().unwrap();
    *data.requests.entry(address.clone()).or_insert(0) += 1;

    if let Some(remaining) = data.failures.get_mut(&address) {
        if *remaining > 0 {
            *remaining -= 1;
            return (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable").into_response();
        }
    }

    if data.bare_not_found.contains(&address) {
        return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
    }

    match data.counters.get(&address) {
        Some(counters) => Json(counters.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not found"}))).into_response(),
    }
}

async fn rpc(Json(request): Json<Value>) -> Json<Value> {
    let result = match request["method"].as_str() {
        Some("eth_blockNumber") => json!("0x64"),
        Some("eth_getBlockByNumber") => json!({
            "number": request["params"][0].clone(),
            "baseFeePerGas": BASE_FEE_HEX
        }),
        _ => Value::Null,
    };

    Json(json!({"jsonrpc": "2.0", "id": request["id"].clone(), "result": result}))
}

pub fn snapshot_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "chain-metrics-{}-{}.json",
        name,
        std::process::id()
    ))
}

pub fn test_config(base_url: &str, name: &str) -> Config {
    Config {
        network: Network::Testnet,
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        db_connection_retries: 0,
        db_connection_interval: Duration::from_millis(10),
        metadata_base_url: base_url.to_string(),
        explorer_url: Some(base_url.to_string()),
        eth_endpoint: format!("{}/rpc", base_url),
        metrics_filepath: snapshot_path(name),
        api_error_retries: 3,
        api_error_timeout: TEST_RETRY_DELAY,
        metrics_check_interval: Duration::from_secs(300),
        metrics_error_check_interval: Duration::from_secs(30),
        gas_estimation_iterations: 1,
        block_sampling: 100,
        http_timeout: Duration::from_secs(5),
    }
}

/// Mock server, in-memory store and app state wired together.
pub async fn setup(name: &str) -> (MockExplorer, AppState) {
    let mock = MockExplorer::new();
    let base_url = mock.spawn().await;

    let store = DeltaStore::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let state = AppState::new(test_config(&base_url, name), store).expect("Failed to build state");

    (mock, state)
}
