//! Minimal JSON-RPC plumbing over HTTP.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Timeout applied to each individual HTTP request. Waiting for confirmation
/// is handled by the caller through polling, not by this per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Issue a single JSON-RPC call and deserialize the `result` field.
///
/// A `null` result deserializes into `None` when `T` is an `Option`, which is
/// how `eth_getTransactionReceipt` reports a not-yet-mined transaction.
pub async fn call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T> {
    let response: Value = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {method} request"))?
        .json()
        .await
        .with_context(|| format!("Failed to parse {method} response"))?;

    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        anyhow::bail!("{method} failed: {message}");
    }

    let result = response.get("result").cloned().unwrap_or(Value::Null);
    serde_json::from_value(result)
        .with_context(|| format!("Failed to deserialize {method} result"))
}
