//! Solana Chain Gateway
//!
//! Mints through Bubblegum with the platform authority as fee payer, tree
//! delegate and (optionally) collection authority. The collector's wallet is
//! leaf owner and delegate and never signs.

use std::sync::Arc;

use platform::solana::rpc::LatestBlockhash;
use platform::solana::{Commitment, Keypair, Pubkey, RpcClient, Transaction};

use crate::domain::chain::{AssetLookup, ChainGateway, PreparedMint, SignatureState};
use crate::domain::entities::CollectiblePost;
use crate::error::{CollectError, CollectResult};
use crate::infra::bubblegum::{self, CollectionAccounts, Creator, MetadataArgs, MintAccounts};

const FALLBACK_NAME: &str = "Collectible";

/// What gets minted and where
#[derive(Debug, Clone)]
pub struct MintConfig {
    pub merkle_tree: Pubkey,
    /// Verified collection to mint into, if any
    pub collection_mint: Option<Pubkey>,
    pub symbol: String,
    /// Used when a post has no metadata URI of its own
    pub metadata_base_url: String,
}

impl MintConfig {
    pub fn new(merkle_tree: Pubkey) -> Self {
        Self {
            merkle_tree,
            collection_mint: None,
            symbol: "COLLECT".to_string(),
            metadata_base_url: "http://localhost:31113/metadata".to_string(),
        }
    }

    fn metadata_for(&self, post: &CollectiblePost) -> MetadataArgs {
        let title = post.title.trim();
        let uri = post.metadata_uri.clone().unwrap_or_else(|| {
            format!(
                "{}/{}.json",
                self.metadata_base_url.trim_end_matches('/'),
                post.post_id
            )
        });
        let creators = post
            .creator_wallet
            .as_deref()
            .and_then(|wallet| wallet.parse::<Pubkey>().ok())
            .map(|address| {
                vec![Creator {
                    address,
                    verified: false,
                    share: 100,
                }]
            })
            .unwrap_or_default();

        MetadataArgs {
            name: if title.is_empty() { FALLBACK_NAME } else { title }.to_string(),
            symbol: self.symbol.clone(),
            uri,
            seller_fee_basis_points: 0,
            primary_sale_happened: false,
            is_mutable: true,
            collection: self.collection_mint,
            creators,
        }
    }
}

/// [`ChainGateway`] over Solana JSON-RPC
pub struct SolanaChainGateway {
    rpc: Arc<RpcClient>,
    authority: Arc<Keypair>,
    mint: MintConfig,
}

impl SolanaChainGateway {
    pub fn new(rpc: Arc<RpcClient>, authority: Arc<Keypair>, mint: MintConfig) -> Self {
        Self {
            rpc,
            authority,
            mint,
        }
    }

    pub fn authority(&self) -> Pubkey {
        self.authority.pubkey()
    }

    /// Build and sign the mint against a known blockhash
    pub fn build_mint(
        &self,
        post: &CollectiblePost,
        recipient: &str,
        blockhash: &LatestBlockhash,
    ) -> CollectResult<PreparedMint> {
        let leaf_owner: Pubkey = recipient
            .trim()
            .parse()
            .map_err(|_| CollectError::Validation("Invalid wallet address".to_string()))?;
        let authority = self.authority.pubkey();
        let accounts = MintAccounts {
            merkle_tree: self.mint.merkle_tree,
            leaf_owner,
            payer: authority,
            tree_delegate: authority,
        };
        let metadata = self.mint.metadata_for(post);

        let instruction = match self.mint.collection_mint {
            Some(mint) => bubblegum::mint_to_collection_v1(
                &accounts,
                &CollectionAccounts {
                    mint,
                    authority,
                },
                &metadata,
            ),
            None => bubblegum::mint_v1(&accounts, &metadata),
        }
        .map_err(|e| CollectError::MintBuild(format!("address derivation: {e}")))?;

        let tx = Transaction::new_signed(&[instruction], &self.authority, &[], blockhash.blockhash)
            .map_err(|e| CollectError::MintBuild(e.to_string()))?;

        Ok(PreparedMint {
            signature: tx.signature(),
            serialized_tx: tx.to_base64(),
            last_valid_block_height: blockhash.last_valid_block_height,
        })
    }
}

impl ChainGateway for SolanaChainGateway {
    async fn prepare_mint(
        &self,
        post: &CollectiblePost,
        recipient: &str,
    ) -> CollectResult<PreparedMint> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        self.build_mint(post, recipient, &blockhash)
    }

    async fn broadcast(&self, serialized_tx: &str) -> CollectResult<()> {
        let signature = self.rpc.send_transaction(serialized_tx).await?;
        tracing::debug!(signature = %signature, "Transaction sent");
        Ok(())
    }

    async fn signature_state(&self, signature: &str) -> CollectResult<SignatureState> {
        let statuses = self.rpc.get_signature_statuses(&[signature]).await?;
        let Some(status) = statuses.into_iter().next().flatten() else {
            return Ok(SignatureState::Unknown);
        };

        if let Some(err) = status.err {
            return Ok(SignatureState::Failed(err.to_string()));
        }

        // Rooted entries report no confirmation count and may omit the level
        let level = status
            .confirmation_status
            .unwrap_or(match status.confirmations {
                None => Commitment::Finalized,
                Some(_) => Commitment::Processed,
            });

        if level.satisfies(self.rpc.commitment()) {
            Ok(SignatureState::Landed)
        } else {
            Ok(SignatureState::Processing)
        }
    }

    async fn block_height(&self) -> CollectResult<u64> {
        Ok(self.rpc.get_block_height().await?)
    }

    async fn asset_id(&self, signature: &str) -> CollectResult<AssetLookup> {
        let Some(tx) = self.rpc.get_transaction(signature).await? else {
            return Ok(AssetLookup::NotYetAvailable);
        };
        Ok(match bubblegum::find_leaf_event(&tx) {
            Some(event) => AssetLookup::Found(event.asset_id.to_string()),
            None => AssetLookup::Missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::PostId;
    use std::time::Duration;

    const COLLECTOR: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    fn gateway(collection_mint: Option<Pubkey>) -> SolanaChainGateway {
        let rpc = RpcClient::new(
            "http://127.0.0.1:8899",
            Duration::from_secs(1),
            Commitment::Confirmed,
        )
        .unwrap();
        let mut mint = MintConfig::new(Pubkey::new_from_array([7; 32]));
        mint.collection_mint = collection_mint;
        SolanaChainGateway::new(Arc::new(rpc), Arc::new(Keypair::generate()), mint)
    }

    fn post() -> CollectiblePost {
        CollectiblePost {
            post_id: PostId::new(),
            post_type: "collectible".into(),
            deleted: false,
            creator_wallet: Some("DRpbCBMxVnDK7maPM5tGv6MvB3v1sRMC86PZ8okm21hy".into()),
            title: "  Sunset over the bay  ".into(),
            metadata_uri: None,
        }
    }

    fn blockhash() -> LatestBlockhash {
        LatestBlockhash {
            blockhash: [3; 32],
            last_valid_block_height: 1_234,
        }
    }

    fn decode(mint: &PreparedMint) -> Vec<u8> {
        platform::crypto::from_base64(&mint.serialized_tx).unwrap()
    }

    #[test]
    fn test_authority_is_the_only_signer() {
        let gateway = gateway(None);
        let mint = gateway.build_mint(&post(), COLLECTOR, &blockhash()).unwrap();
        let bytes = decode(&mint);

        // one signature, then header [1 required, 0 readonly signed, ...]
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[65], 1);
        assert_eq!(bytes[66], 0);
        assert_eq!(&bytes[1..65], bs58::decode(&mint.signature).into_vec().unwrap());
        assert_eq!(mint.last_valid_block_height, 1_234);

        // fee payer key is the first account key
        assert_eq!(&bytes[69..101], gateway.authority().as_bytes());
    }

    #[test]
    fn test_metadata_defaults() {
        let mint = MintConfig::new(Pubkey::default());
        let post = post();
        let args = mint.metadata_for(&post);

        assert_eq!(args.name, "Sunset over the bay");
        assert_eq!(
            args.uri,
            format!("http://localhost:31113/metadata/{}.json", post.post_id)
        );
        assert_eq!(args.creators.len(), 1);
        assert_eq!(args.creators[0].share, 100);
        assert!(!args.creators[0].verified);
        assert_eq!(args.seller_fee_basis_points, 0);
    }

    #[test]
    fn test_post_uri_and_blank_title() {
        let mint = MintConfig::new(Pubkey::default());
        let mut post = post();
        post.title = "   ".into();
        post.metadata_uri = Some("https://cdn.example/meta/1.json".into());
        post.creator_wallet = Some("not-a-key".into());

        let args = mint.metadata_for(&post);
        assert_eq!(args.name, "Collectible");
        assert_eq!(args.uri, "https://cdn.example/meta/1.json");
        assert!(args.creators.is_empty());
    }

    #[test]
    fn test_collection_mint_uses_collection_instruction() {
        let plain = gateway(None)
            .build_mint(&post(), COLLECTOR, &blockhash())
            .unwrap();
        let with_collection = gateway(Some(Pubkey::new_from_array([9; 32])))
            .build_mint(&post(), COLLECTOR, &blockhash())
            .unwrap();

        let plain = decode(&plain);
        let with_collection = decode(&with_collection);
        let has = |bytes: &[u8], needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);

        assert!(has(&plain, &bubblegum::MINT_V1_DISCRIMINATOR));
        assert!(has(
            &with_collection,
            &bubblegum::MINT_TO_COLLECTION_V1_DISCRIMINATOR
        ));
        assert!(has(&with_collection, &[9; 32]));
    }

    #[test]
    fn test_bad_recipient_is_validation_error() {
        let err = gateway(None)
            .build_mint(&post(), "0xdeadbeef", &blockhash())
            .unwrap_err();
        assert!(matches!(err, CollectError::Validation(_)));
    }
}
