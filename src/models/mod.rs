// Database row models and the explorer counter payloads

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub id: i64,
    pub chain_name: String,
    pub address: String,
    pub app_name: String,
}

/// One calendar-day observation of an address's cumulative transaction count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TransactionCount {
    pub address_id: i64,
    pub date: NaiveDate,
    pub total_transactions: i64,
    pub daily_transactions: i64,
}

/// Raw counters as reported by `/api/v2/addresses/{address}/counters`.
///
/// The explorer encodes every value as a decimal string. Missing fields fall
/// back to `"0"` and unknown fields are ignored, since the payload varies
/// between explorer versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressCounters {
    pub gas_usage_count: String,
    pub token_transfers_count: String,
    pub transactions_count: String,
    pub validations_count: String,
}

impl AddressCounters {
    /// Counter value used for addresses the explorer has never seen.
    pub fn empty() -> Self {
        Self {
            gas_usage_count: "0".to_string(),
            token_transfers_count: "0".to_string(),
            transactions_count: "0".to_string(),
            validations_count: "0".to_string(),
        }
    }
}

impl Default for AddressCounters {
    fn default() -> Self {
        Self::empty()
    }
}

/// Raw counters merged with the windowed transaction sums from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressMetrics {
    #[serde(flatten)]
    pub counters: AddressCounters,
    pub transactions_today: i64,
    pub transactions_last_7_days: i64,
    pub transactions_last_30_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counters_tolerate_missing_and_extra_fields() {
        let counters: AddressCounters = serde_json::from_value(json!({
            "transactions_count": "1734",
            "gas_usage_count": "16935",
            "new_field": 1
        }))
        .unwrap();

        assert_eq!(counters.transactions_count, "1734");
        assert_eq!(counters.gas_usage_count, "16935");
        assert_eq!(counters.validations_count, "0");
        assert_eq!(counters.token_transfers_count, "0");
    }

    #[test]
    fn metrics_serialize_flat() {
        let metrics = AddressMetrics {
            counters: AddressCounters::empty(),
            transactions_today: 5,
            transactions_last_7_days: 10,
            transactions_last_30_days: 20,
        };
        let value = serde_json::to_value(&metrics).unwrap();

        assert_eq!(value["transactions_count"], "0");
        assert_eq!(value["transactions_last_7_days"], 10);
        assert!(value.get("counters").is_none());
    }
}
