//! Read-only access to the campaign contract.
//!
//! The contract is reached through a JSON-RPC endpoint exposing its view
//! methods (`getCampaign`, `getDonorCount`, `campaignCount`). Transaction
//! submission lives elsewhere; nothing here mutates ledger state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::amount;
use crate::error::AppError;

/// Authoritative campaign state as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    /// Filled in by the client from the requested id.
    #[serde(default)]
    pub id: u64,
    pub creator: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "amount::deserialize_amount")]
    pub goal: u128,
    #[serde(alias = "raisedAmount", deserialize_with = "amount::deserialize_amount")]
    pub raised: u128,
    #[serde(deserialize_with = "amount::deserialize_timestamp")]
    pub deadline: i64,
}

/// Read accessors the aggregation layer needs from the ledger.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch one campaign record. Failures are `AppError::ContractRead`.
    async fn get_campaign(&self, id: u64) -> Result<CampaignRecord, AppError>;

    async fn get_donor_count(&self, id: u64) -> Result<u64, AppError>;

    async fn campaign_count(&self) -> Result<u64, AppError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(transparent)]
struct Count(#[serde(deserialize_with = "amount::deserialize_count")] u64);

/// `LedgerClient` speaking JSON-RPC 2.0 over HTTP.
pub struct RpcLedgerClient {
    rpc_url: String,
    client: Client,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcLedgerClient {
    pub fn new(rpc_url: impl Into<String>, client: Client, timeout: Duration) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            client,
            timeout,
            next_id: AtomicU64::new(1),
        }
    }

    #[tracing::instrument(skip(self, params), fields(rpc_url = %self.rpc_url))]
    async fn call(&self, method: &str, params: Value) -> Result<Value, AppError> {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| contract_read(method, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ContractRead(format!(
                "{} returned HTTP status {}",
                method, status
            )));
        }

        let payload: RpcResponse = response.json().await.map_err(|e| contract_read(method, e))?;
        if let Some(err) = payload.error {
            return Err(AppError::ContractRead(format!(
                "{} failed with code {}: {}",
                method, err.code, err.message
            )));
        }

        payload
            .result
            .filter(|v| !v.is_null())
            .ok_or_else(|| AppError::ContractRead(format!("{} returned no result", method)))
    }
}

fn contract_read(method: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::ContractRead(format!("{} timed out: {}", method, err))
    } else {
        AppError::ContractRead(format!("{}: {}", method, err))
    }
}

#[async_trait::async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn get_campaign(&self, id: u64) -> Result<CampaignRecord, AppError> {
        let value = self.call("getCampaign", json!([id])).await?;
        let mut record: CampaignRecord = serde_json::from_value(value).map_err(|e| {
            AppError::ContractRead(format!("malformed campaign record {}: {}", id, e))
        })?;
        record.id = id;
        Ok(record)
    }

    async fn get_donor_count(&self, id: u64) -> Result<u64, AppError> {
        let value = self.call("getDonorCount", json!([id])).await?;
        let Count(count) = serde_json::from_value(value)
            .map_err(|e| AppError::ContractRead(format!("malformed donor count: {}", e)))?;
        Ok(count)
    }

    async fn campaign_count(&self) -> Result<u64, AppError> {
        let value = self.call("campaignCount", json!([])).await?;
        let Count(count) = serde_json::from_value(value)
            .map_err(|e| AppError::ContractRead(format!("malformed campaign count: {}", e)))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_raised_amount_alias_and_string_amounts() {
        let value = json!({
            "creator": "0xabc",
            "title": "Wells",
            "description": "Clean water",
            "goal": "1000000000000000000",
            "raisedAmount": 250,
            "deadline": "1700000000"
        });
        let record: CampaignRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.goal, 1_000_000_000_000_000_000);
        assert_eq!(record.raised, 250);
        assert_eq!(record.deadline, 1_700_000_000);
        assert_eq!(record.id, 0);
    }

    #[test]
    fn record_accepts_numeric_goal_above_u64() {
        let raw = r#"{"creator":"0xabc","goal":20000000000000000000,"raised":0,"deadline":1700000000}"#;

        let direct: CampaignRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(direct.goal, 20_000_000_000_000_000_000);

        // The RPC client decodes through a `Value` first.
        let via_value: CampaignRecord =
            serde_json::from_value(serde_json::from_str::<Value>(raw).unwrap()).unwrap();
        assert_eq!(via_value.goal, 20_000_000_000_000_000_000);
        assert_eq!(via_value.deadline, 1_700_000_000);
    }
}
