//! Domain Entities

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use kernel::id::{CollectionId, PostId, UserId};

use crate::domain::chain::PreparedMint;

/// `post_type` of posts that can be collected
pub const COLLECTIBLE_POST_TYPE: &str = "collectible";

/// Read-only view of a post in the post directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectiblePost {
    pub post_id: PostId,
    pub post_type: String,
    pub deleted: bool,
    /// Wallet of the post author, listed as an unverified creator
    pub creator_wallet: Option<String>,
    pub title: String,
    pub metadata_uri: Option<String>,
}

impl CollectiblePost {
    pub fn is_collectible(&self) -> bool {
        self.post_type == COLLECTIBLE_POST_TYPE
    }
}

/// Stored state of a collection request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionStatus {
    Pending,
    Confirmed,
    Failed,
}

impl CollectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Pending => "pending",
            CollectionStatus::Confirmed => "confirmed",
            CollectionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CollectionStatus::Pending)
    }
}

impl FromStr for CollectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CollectionStatus::Pending),
            "confirmed" => Ok(CollectionStatus::Confirmed),
            "failed" => Ok(CollectionStatus::Failed),
            other => Err(format!("unknown collection status: {other}")),
        }
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mint attempt for a (post, user) pair
///
/// Rows are written before the transaction is broadcast, so the signature,
/// the signed transaction and its last valid block height are always known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRequest {
    pub id: CollectionId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub wallet_address: String,
    pub status: CollectionStatus,
    pub tx_signature: String,
    pub asset_id: Option<String>,
    /// base64 wire transaction, re-sent verbatim by the confirmation tracker
    pub serialized_tx: String,
    pub last_valid_block_height: u64,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionRequest {
    pub fn pending(
        post_id: PostId,
        user_id: UserId,
        wallet_address: impl Into<String>,
        mint: PreparedMint,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CollectionId::new(),
            post_id,
            user_id,
            wallet_address: wallet_address.into(),
            status: CollectionStatus::Pending,
            tx_signature: mint.signature,
            asset_id: None,
            serialized_tx: mint.serialized_tx,
            last_valid_block_height: mint.last_valid_block_height,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == CollectionStatus::Pending
    }

    /// Apply a terminal transition; no-op unless still pending
    pub fn apply(&mut self, transition: &Transition, now: DateTime<Utc>) -> bool {
        if !self.is_pending() {
            return false;
        }
        match transition {
            Transition::Confirmed { asset_id } => {
                self.status = CollectionStatus::Confirmed;
                self.asset_id = asset_id.clone();
            }
            Transition::Failed { reason } => {
                self.status = CollectionStatus::Failed;
                self.failure_reason = Some(reason.clone());
            }
        }
        self.updated_at = now;
        true
    }
}

/// Terminal transition of a pending request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Confirmed { asset_id: Option<String> },
    Failed { reason: String },
}

impl Transition {
    pub fn failed(reason: impl Into<String>) -> Self {
        Transition::Failed {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> CollectionStatus {
        match self {
            Transition::Confirmed { .. } => CollectionStatus::Confirmed,
            Transition::Failed { .. } => CollectionStatus::Failed,
        }
    }
}

/// Result of `prepareCollect`
///
/// `AlreadyCollected` is a response classification, never a stored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectOutcome {
    Pending(CollectionRequest),
    AlreadyCollected(CollectionRequest),
}

impl CollectOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            CollectOutcome::Pending(_) => "pending",
            CollectOutcome::AlreadyCollected(_) => "already_collected",
        }
    }

    pub fn request(&self) -> &CollectionRequest {
        match self {
            CollectOutcome::Pending(r) | CollectOutcome::AlreadyCollected(r) => r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CollectionRequest {
        CollectionRequest::pending(
            PostId::new(),
            UserId::new(),
            "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
            PreparedMint {
                signature: "sig".into(),
                serialized_tx: "AQ==".into(),
                last_valid_block_height: 1_000,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            CollectionStatus::Pending,
            CollectionStatus::Confirmed,
            CollectionStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<CollectionStatus>(), Ok(status));
        }
        assert!("collected".parse::<CollectionStatus>().is_err());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut req = request();
        let now = Utc::now();

        assert!(req.apply(&Transition::Confirmed { asset_id: Some("asset".into()) }, now));
        assert_eq!(req.status, CollectionStatus::Confirmed);

        assert!(!req.apply(&Transition::failed("late failure"), now));
        assert_eq!(req.status, CollectionStatus::Confirmed);
        assert_eq!(req.failure_reason, None);
    }

    #[test]
    fn test_collectible_type() {
        let mut post = CollectiblePost {
            post_id: PostId::new(),
            post_type: "collectible".into(),
            deleted: false,
            creator_wallet: None,
            title: "t".into(),
            metadata_uri: None,
        };
        assert!(post.is_collectible());
        post.post_type = "text".into();
        assert!(!post.is_collectible());
    }
}
