use alloy_primitives::{Address, B256, Bytes, U64};
use alloy_sol_types::{Revert, SolError};
use ir_chain_client::{ChainError, TxReceipt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// EIP-1193 "user rejected request".
const USER_REJECTED_CODE: i64 = 4001;
/// Geth/BSC execution error carrying revert data.
const EXECUTION_ERROR_CODE: i64 = 3;

/// JSON-RPC transport to the wallet provider.
///
/// Reads `IRITNOMIC_RPC_URL` from environment at construction time
/// (default: `http://localhost:8545`). The endpoint must sign
/// `eth_sendTransaction` for its accounts: a node with unlocked accounts or an
/// EIP-1193 bridge in front of a browser wallet.
pub struct RpcTransport {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
    receipt_poll_interval: Duration,
}

impl Default for RpcTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RpcTransport {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("IRITNOMIC_RPC_URL").ok())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        self.request_optional(method, params)
            .await?
            .ok_or_else(|| ChainError::Decode(format!("{method} returned no result")))
    }

    /// Like [`request`](Self::request) but maps a `null` result to `None`.
    pub async fn request_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, ChainError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| ChainError::Transport(format!("{method}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChainError::Transport(format!("{method} HTTP {status}: {text}")));
        }

        let envelope: RpcResponse<T> = response
            .json()
            .await
            .map_err(|err| ChainError::Decode(format!("{method}: {err}")))?;

        if let Some(error) = envelope.error {
            debug!("{} failed with rpc error {}: {}", method, error.code, error.message);
            return Err(classify_rpc_error(&error));
        }

        Ok(envelope.result)
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    /// Submits through the provider's signer and waits for the receipt.
    ///
    /// There is no confirmation timeout; a mined receipt with status 0 is a
    /// revert.
    pub async fn send_transaction(&self, from: Address, to: Address, data: Bytes) -> Result<TxReceipt, ChainError> {
        let tx_hash: B256 = self
            .request(
                "eth_sendTransaction",
                json!([{ "from": from, "to": to, "data": data }]),
            )
            .await?;
        debug!("submitted transaction {} from {} to {}", tx_hash, from, to);

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            return Err(ChainError::Reverted { reason: None });
        }
        Ok(receipt)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ChainError> {
        loop {
            let receipt: Option<RpcReceipt> = self
                .request_optional("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if let Some(receipt) = receipt {
                return Ok(TxReceipt {
                    tx_hash: receipt.transaction_hash,
                    success: receipt.status.is_some_and(|status| status == U64::from(1)),
                    block_number: receipt.block_number.map(|block| block.to::<u64>()),
                });
            }

            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}

// ── JSON-RPC wire types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RpcErrorObject {
    pub(crate) code: i64,
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    status: Option<U64>,
    block_number: Option<U64>,
}

// ── Provider error classification ────────────────────────────────────

pub(crate) fn classify_rpc_error(error: &RpcErrorObject) -> ChainError {
    let lower = error.message.to_lowercase();

    if error.code == USER_REJECTED_CODE || lower.contains("user denied") || lower.contains("user rejected") {
        return ChainError::Rejected;
    }

    if lower.contains("insufficient funds") {
        return ChainError::InsufficientFunds;
    }

    if error.code == EXECUTION_ERROR_CODE || lower.contains("execution reverted") {
        let reason = error
            .data
            .as_ref()
            .and_then(revert_reason_from_data)
            .or_else(|| revert_reason_from_message(&error.message));
        return ChainError::Reverted { reason };
    }

    ChainError::Rpc {
        code: error.code,
        message: error.message.clone(),
    }
}

/// Decodes `Error(string)` revert data, which providers return either as a
/// bare hex string or nested under `data`.
fn revert_reason_from_data(data: &Value) -> Option<String> {
    let encoded = match data {
        Value::String(hex) => hex.as_str(),
        Value::Object(map) => map.get("data")?.as_str()?,
        _ => return None,
    };
    let bytes: Bytes = encoded.parse().ok()?;
    Revert::abi_decode(&bytes, true)
        .ok()
        .map(|revert| revert.reason)
}

fn revert_reason_from_message(message: &str) -> Option<String> {
    let (_, rest) = message.split_once("execution reverted:")?;
    let reason = rest.split('"').next().unwrap_or_default().trim();
    (!reason.is_empty()).then(|| reason.to_owned())
}
