//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::CollectionStatusOutput;
use crate::domain::entities::CollectOutcome;

// ============================================================================
// Collect
// ============================================================================

/// Collect request body, optional as a whole
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectRequest {
    /// Must equal the session wallet when present
    #[serde(default)]
    pub wallet_address: Option<String>,
}

/// Collect response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResponse {
    /// `pending` or `already_collected`
    pub status: &'static str,
    pub collection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
}

impl From<CollectOutcome> for CollectResponse {
    fn from(outcome: CollectOutcome) -> Self {
        let status = outcome.status();
        let request = match outcome {
            CollectOutcome::Pending(r) | CollectOutcome::AlreadyCollected(r) => r,
        };
        Self {
            status,
            collection_id: request.id.to_string(),
            tx_signature: Some(request.tx_signature).filter(|s| !s.is_empty()),
            asset_id: request.asset_id,
        }
    }
}

// ============================================================================
// Status
// ============================================================================

/// Collection status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectStatusResponse {
    pub status: &'static str,
    pub tx_signature: String,
    /// `null` until confirmed
    pub nft_mint: Option<String>,
}

impl From<CollectionStatusOutput> for CollectStatusResponse {
    fn from(output: CollectionStatusOutput) -> Self {
        Self {
            status: output.status.as_str(),
            tx_signature: output.tx_signature,
            nft_mint: output.nft_mint,
        }
    }
}
