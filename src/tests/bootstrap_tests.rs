use super::support::setup;
use crate::collector::bootstrap::{bootstrap_store_on, BootstrapError, BootstrapOutcome, BASELINE_DAYS};
use crate::collector::collect_metrics_on;
use chrono::{Duration, NaiveDate};
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 17).unwrap()
}

fn metadata() -> serde_json::Value {
    json!({
        "__offchain": {"apps": {"bridge": {"contracts": ["0xOFF"]}}},
        "chain1": {
            "apps": {
                "appA": {"contracts": ["0xAAA"]},
                "appB": {"contracts": ["0xNEW"]}
            }
        }
    })
}

#[tokio::test]
async fn test_bootstrap_seeds_flat_history() {
    let (mock, state) = setup("bootstrap-seed").await;
    mock.set_metadata(metadata());
    mock.set_chain_stats(Some(json!({"average_block_time": 5.0})));
    mock.set_transactions("0xAAA", 500);

    let outcome = bootstrap_store_on(&state, today()).await.unwrap();
    assert_eq!(
        outcome,
        BootstrapOutcome::Seeded {
            addresses: 2,
            rows: 2 * BASELINE_DAYS as usize
        }
    );
    assert_eq!(state.store.address_count().await.unwrap(), 2);
    assert_eq!(mock.requests("0xOFF"), 0);

    let seeded = state.store.history("0xAAA").await.unwrap();
    assert_eq!(seeded.len(), BASELINE_DAYS as usize);
    assert_eq!(seeded.first().unwrap().date, today() - Duration::days(BASELINE_DAYS));
    assert!(seeded
        .iter()
        .all(|row| row.total_transactions == 500 && row.daily_transactions == 0));

    let unknown = state.store.history("0xNEW").await.unwrap();
    assert!(unknown.iter().all(|row| row.total_transactions == 0));

    // The first live pass sees no activity instead of the whole lifetime total.
    let snapshot = collect_metrics_on(&state, today()).await.unwrap();
    let counter = &snapshot.metrics["chain1"].apps_counters["appA"]["0xAAA"];
    assert_eq!(counter.transactions_today, 0);
    assert_eq!(counter.transactions_last_30_days, 0);
}

#[tokio::test]
async fn test_bootstrap_skipped_when_store_has_addresses() {
    let (mock, state) = setup("bootstrap-skip").await;
    mock.set_metadata(metadata());
    mock.set_transactions("0xAAA", 500);

    state
        .store
        .get_or_create_address("chain1", "0xAAA", "appA")
        .await
        .unwrap();

    let outcome = bootstrap_store_on(&state, today()).await.unwrap();
    assert_eq!(outcome, BootstrapOutcome::Skipped { existing: 1 });
    assert_eq!(mock.requests("0xAAA"), 0);
    assert!(state
        .store
        .history("0xAAA")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_bootstrap_fetch_failure_writes_nothing() {
    let (mock, state) = setup("bootstrap-failure").await;
    mock.set_metadata(metadata());
    mock.set_transactions("0xAAA", 500);
    mock.fail_next("0xNEW", usize::MAX);

    let result = bootstrap_store_on(&state, today()).await;

    assert!(matches!(result, Err(BootstrapError::Fetch(_))));
    assert_eq!(state.store.address_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_bootstrap_metadata_failure() {
    let (_mock, state) = setup("bootstrap-metadata").await;

    let result = bootstrap_store_on(&state, today()).await;

    assert!(matches!(result, Err(BootstrapError::Metadata(_))));
    assert_eq!(state.store.address_count().await.unwrap(), 0);
}
