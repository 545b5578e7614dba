//! Chain Gateway
//!
//! Outbound port to the blockchain. The production implementation lives in
//! `infra::chain`; tests substitute a scripted fake.

use crate::domain::entities::CollectiblePost;
use crate::error::CollectResult;

/// Signed mint transaction, ready to be persisted and broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMint {
    /// base58 fee-payer signature, which is also the transaction id
    pub signature: String,
    /// base64 wire encoding
    pub serialized_tx: String,
    /// The transaction can never land once the chain passes this height
    pub last_valid_block_height: u64,
}

/// What the chain knows about a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Not seen by the cluster
    Unknown,
    /// Seen, below the configured commitment
    Processing,
    /// Reached the configured commitment without error
    Landed,
    /// Executed with an error
    Failed(String),
}

/// Asset id lookup for a landed mint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLookup {
    /// Transaction not retrievable yet
    NotYetAvailable,
    Found(String),
    /// Transaction retrieved but no leaf event in it
    Missing,
}

#[trait_variant::make(ChainGateway: Send)]
pub trait LocalChainGateway {
    /// Build and sign a mint of `post` to `recipient` against a fresh blockhash
    async fn prepare_mint(
        &self,
        post: &CollectiblePost,
        recipient: &str,
    ) -> CollectResult<PreparedMint>;

    /// Submit a signed transaction; sending the same bytes twice is harmless
    async fn broadcast(&self, serialized_tx: &str) -> CollectResult<()>;

    async fn signature_state(&self, signature: &str) -> CollectResult<SignatureState>;

    async fn block_height(&self) -> CollectResult<u64>;

    async fn asset_id(&self, signature: &str) -> CollectResult<AssetLookup>;
}
