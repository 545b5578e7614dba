//! Solana JSON-RPC client
//!
//! Thin typed wrapper over the handful of methods the mint pipeline uses.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
}

impl RpcError {
    /// Whether repeating the same call may succeed
    ///
    /// Transport failures and server-side errors are transient; a rejected
    /// transaction (preflight failure, bad signature) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Transport(_) => true,
            RpcError::Rpc { code, .. } => matches!(code, -32005 | -32004 | -32603 | -32000),
            RpcError::InvalidResponse(_) => false,
        }
    }
}

/// Commitment level used for reads and preflight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }

    /// Whether a status at `self` satisfies a requirement of `required`
    pub fn satisfies(&self, required: Commitment) -> bool {
        self.rank() >= required.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            Commitment::Processed => 0,
            Commitment::Confirmed => 1,
            Commitment::Finalized => 2,
        }
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(format!("unknown commitment level: {other}")),
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blockhash plus the last block height at which it is still accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: [u8; 32],
    pub last_valid_block_height: u64,
}

/// Entry of `getSignatureStatuses`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    pub confirmations: Option<u64>,
    pub err: Option<Value>,
    pub confirmation_status: Option<Commitment>,
}

/// Inner instruction as returned with `encoding: json`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiInnerInstruction {
    pub program_id_index: u8,
    #[serde(default)]
    pub accounts: Vec<u8>,
    /// base58 instruction data
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UiInnerInstructions {
    pub index: u8,
    pub instructions: Vec<UiInnerInstruction>,
}

/// The parts of `getTransaction` the confirmation tracker reads
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedTransaction {
    pub slot: u64,
    pub account_keys: Vec<String>,
    pub err: Option<Value>,
    pub inner_instructions: Vec<UiInnerInstructions>,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    slot: u64,
    transaction: RawTransactionBody,
    meta: Option<RawMeta>,
}

#[derive(Deserialize)]
struct RawTransactionBody {
    message: RawMessage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    account_keys: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeta {
    err: Option<Value>,
    #[serde(default)]
    inner_instructions: Option<Vec<UiInnerInstructions>>,
}

/// JSON-RPC client
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    commitment: Commitment,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        commitment: Commitment,
    ) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            commitment,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response: RpcResponse<T> = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            tracing::debug!(method, code = err.code, message = %err.message, "RPC call failed");
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        response
            .result
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: missing result")))
    }

    /// Variant of `call` where a JSON `null` result is a valid answer
    async fn call_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, RpcError> {
        let value: Value = match self.call(method, params).await {
            Ok(value) => value,
            Err(RpcError::InvalidResponse(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
    }

    pub async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, RpcError> {
        let response: WithContext<BlockhashValue> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;

        let bytes = bs58::decode(&response.value.blockhash)
            .into_vec()
            .map_err(|e| RpcError::InvalidResponse(format!("blockhash: {e}")))?;
        let blockhash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| RpcError::InvalidResponse("blockhash: wrong length".into()))?;

        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height: response.value.last_valid_block_height,
        })
    }

    /// Submit a base64 transaction; returns its signature
    pub async fn send_transaction(&self, tx_base64: &str) -> Result<String, RpcError> {
        self.call(
            "sendTransaction",
            json!([
                tx_base64,
                {
                    "encoding": "base64",
                    "skipPreflight": false,
                    "preflightCommitment": self.commitment.as_str(),
                    "maxRetries": 0
                }
            ]),
        )
        .await
    }

    pub async fn get_signature_statuses(
        &self,
        signatures: &[&str],
    ) -> Result<Vec<Option<SignatureStatus>>, RpcError> {
        let response: WithContext<Vec<Option<SignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([signatures, { "searchTransactionHistory": true }]),
            )
            .await?;
        Ok(response.value)
    }

    pub async fn get_block_height(&self) -> Result<u64, RpcError> {
        self.call(
            "getBlockHeight",
            json!([{ "commitment": self.commitment.as_str() }]),
        )
        .await
    }

    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ConfirmedTransaction>, RpcError> {
        // getTransaction does not accept "processed"
        let commitment = match self.commitment {
            Commitment::Processed => Commitment::Confirmed,
            other => other,
        };
        let raw: Option<RawTransaction> = self
            .call_optional(
                "getTransaction",
                json!([
                    signature,
                    {
                        "encoding": "json",
                        "commitment": commitment.as_str(),
                        "maxSupportedTransactionVersion": 0
                    }
                ]),
            )
            .await?;

        Ok(raw.map(|raw| {
            let (err, inner_instructions) = match raw.meta {
                Some(meta) => (meta.err, meta.inner_instructions.unwrap_or_default()),
                None => (None, Vec::new()),
            };
            ConfirmedTransaction {
                slot: raw.slot,
                account_keys: raw.transaction.message.account_keys,
                err,
                inner_instructions,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_ordering() {
        assert!(Commitment::Finalized.satisfies(Commitment::Confirmed));
        assert!(Commitment::Confirmed.satisfies(Commitment::Confirmed));
        assert!(!Commitment::Processed.satisfies(Commitment::Confirmed));
        assert_eq!("Finalized".parse::<Commitment>(), Ok(Commitment::Finalized));
        assert!("max".parse::<Commitment>().is_err());
    }

    #[test]
    fn test_signature_status_deserialize() {
        let value = json!({
            "context": { "slot": 82 },
            "value": [
                {
                    "slot": 72,
                    "confirmations": 10,
                    "err": null,
                    "status": { "Ok": null },
                    "confirmationStatus": "confirmed"
                },
                null
            ]
        });

        let parsed: WithContext<Vec<Option<SignatureStatus>>> =
            serde_json::from_value(value).unwrap();
        let first = parsed.value[0].as_ref().unwrap();
        assert_eq!(first.confirmation_status, Some(Commitment::Confirmed));
        assert!(first.err.is_none());
        assert!(parsed.value[1].is_none());
    }

    #[test]
    fn test_transaction_deserialize() {
        let value = json!({
            "slot": 430,
            "transaction": {
                "message": { "accountKeys": ["A", "B", "C"] },
                "signatures": ["sig"]
            },
            "meta": {
                "err": null,
                "innerInstructions": [
                    { "index": 0, "instructions": [
                        { "programIdIndex": 2, "accounts": [], "data": "3Bxs" }
                    ]}
                ]
            }
        });

        let raw: RawTransaction = serde_json::from_value(value).unwrap();
        let meta = raw.meta.unwrap();
        assert_eq!(raw.transaction.message.account_keys.len(), 3);
        assert_eq!(meta.inner_instructions.unwrap()[0].instructions[0].program_id_index, 2);
    }

    #[test]
    fn test_error_transience() {
        let rejected = RpcError::Rpc {
            code: -32002,
            message: "Transaction simulation failed".into(),
        };
        assert!(!rejected.is_transient());
        assert!(
            RpcError::Rpc {
                code: -32005,
                message: "Node is behind".into()
            }
            .is_transient()
        );
    }
}
