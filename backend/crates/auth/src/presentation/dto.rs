//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{GenerateChallengeOutput, VerifySignatureOutput};
use crate::domain::entity::user::User;

// ============================================================================
// Challenge
// ============================================================================

/// Challenge request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub wallet_address: String,
}

/// Challenge response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    /// Text to sign, byte for byte
    pub message: String,
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

impl From<GenerateChallengeOutput> for ChallengeResponse {
    fn from(output: GenerateChallengeOutput) -> Self {
        Self {
            message: output.message,
            nonce: output.nonce,
            expires_at: output.expires_at,
        }
    }
}

// ============================================================================
// Verify
// ============================================================================

/// Verify request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub wallet_address: String,
    pub signature: String,
    pub message: String,
    #[serde(default)]
    pub wallet_name: Option<String>,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: String,
    pub public_id: String,
    pub wallet_address: String,
    pub wallet_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            public_id: user.public_id.to_string(),
            wallet_address: user.wallet_address.to_string(),
            wallet_name: user.wallet_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Verify response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
    pub is_new_user: bool,
}

impl From<VerifySignatureOutput> for VerifyResponse {
    fn from(output: VerifySignatureOutput) -> Self {
        Self {
            token: output.session.token,
            expires_at: output.session.expires_at,
            user: UserResponse::from(&output.user),
            is_new_user: output.is_new_user,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Session introspection response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: String,
    pub wallet_address: String,
}
