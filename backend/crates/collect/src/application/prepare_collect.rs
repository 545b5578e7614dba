//! Prepare Collect Use Case
//!
//! Validates the post, deduplicates per (post, user), applies the collect
//! rate limits, then builds, persists and broadcasts the mint. The row is
//! written before the broadcast so a crash between the two leaves a
//! reconcilable pending record instead of an untracked mint.
//!
//! A row is only failed here when the very first send was rejected outright.
//! Once any attempt ended ambiguously (timeout, node error) the transaction
//! may still land, so the row stays pending and the confirmation tracker
//! settles it from the signature status and blockhash expiry.

use std::sync::Arc;

use kernel::id::{PostId, UserId};
use kernel::time::Clock;
use platform::client::ClientIp;
use platform::rate_limit::RateLimitStore;

use crate::application::config::CollectConfig;
use crate::application::rate_limiter::CollectRateLimiter;
use crate::domain::chain::ChainGateway;
use crate::domain::entities::{CollectOutcome, CollectionRequest, Transition};
use crate::domain::repository::{CollectionRepository, PostRepository};
use crate::error::{CollectError, CollectResult};

/// Prepare collect input
#[derive(Debug, Clone)]
pub struct PrepareCollectInput {
    pub post_id: PostId,
    pub user_id: UserId,
    /// Session wallet, becomes the leaf owner
    pub wallet_address: String,
    pub client: ClientIp,
}

/// Prepare Collect Use Case
pub struct PrepareCollectUseCase<C, P, L, G>
where
    C: CollectionRepository,
    P: PostRepository,
    L: RateLimitStore,
    G: ChainGateway,
{
    collections: Arc<C>,
    posts: Arc<P>,
    limiter: Arc<CollectRateLimiter<L>>,
    chain: Arc<G>,
    config: Arc<CollectConfig>,
    clock: Arc<dyn Clock>,
}

impl<C, P, L, G> PrepareCollectUseCase<C, P, L, G>
where
    C: CollectionRepository,
    P: PostRepository,
    L: RateLimitStore,
    G: ChainGateway,
{
    pub fn new(
        collections: Arc<C>,
        posts: Arc<P>,
        limiter: Arc<CollectRateLimiter<L>>,
        chain: Arc<G>,
        config: Arc<CollectConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            collections,
            posts,
            limiter,
            chain,
            config,
            clock,
        }
    }

    pub async fn execute(&self, input: PrepareCollectInput) -> CollectResult<CollectOutcome> {
        let post = self
            .posts
            .find_post(&input.post_id)
            .await?
            .filter(|post| !post.deleted)
            .ok_or(CollectError::PostNotFound)?;
        if !post.is_collectible() {
            return Err(CollectError::NotCollectible);
        }

        if let Some(existing) = self
            .collections
            .find_active(&input.post_id, &input.user_id)
            .await?
        {
            return Ok(CollectOutcome::AlreadyCollected(existing));
        }

        self.limiter
            .check(&input.user_id, &input.client, self.clock.now())
            .await?;

        let mint = self
            .chain
            .prepare_mint(&post, &input.wallet_address)
            .await?;
        let candidate = CollectionRequest::pending(
            input.post_id,
            input.user_id,
            input.wallet_address,
            mint,
            self.clock.now(),
        );

        let (stored, inserted) = self.collections.insert_or_fetch(&candidate).await?;
        if !inserted {
            tracing::info!(
                collection_id = %stored.id,
                post_id = %stored.post_id,
                user_id = %stored.user_id,
                "Concurrent collect lost the insert race"
            );
            return Ok(CollectOutcome::AlreadyCollected(stored));
        }

        match self.broadcast(&stored).await {
            Ok(()) => {}
            Err(BroadcastFailure::Rejected(e)) => {
                self.collections
                    .transition(
                        &stored.id,
                        &Transition::failed(format!("broadcast rejected: {e}")),
                        self.clock.now(),
                    )
                    .await?;
                return Err(e);
            }
            Err(BroadcastFailure::Undetermined(e)) => {
                tracing::warn!(
                    collection_id = %stored.id,
                    signature = %stored.tx_signature,
                    "Broadcast outcome unknown, leaving pending for reconciliation"
                );
                return Err(e);
            }
        }

        tracing::info!(
            collection_id = %stored.id,
            post_id = %stored.post_id,
            user_id = %stored.user_id,
            signature = %stored.tx_signature,
            "Mint submitted"
        );

        Ok(CollectOutcome::Pending(stored))
    }

    /// Send with bounded retry and exponential backoff
    async fn broadcast(&self, request: &CollectionRequest) -> Result<(), BroadcastFailure> {
        let attempts = self.config.broadcast_attempts.max(1);

        for attempt in 1..=attempts {
            let delay = self.config.backoff_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.chain.broadcast(&request.serialized_tx).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        collection_id = %request.id,
                        attempt,
                        attempts,
                        error = %e,
                        "Mint broadcast attempt failed"
                    );
                    if !e.is_transient() {
                        // a later rejection may be "already processed"
                        return Err(if attempt == 1 {
                            BroadcastFailure::Rejected(e)
                        } else {
                            BroadcastFailure::Undetermined(CollectError::BroadcastFailed {
                                attempts: attempt,
                            })
                        });
                    }
                }
            }
        }

        Err(BroadcastFailure::Undetermined(CollectError::BroadcastFailed {
            attempts,
        }))
    }
}

/// Why a broadcast gave up
enum BroadcastFailure {
    /// The node refused the transaction before any ambiguous send
    Rejected(CollectError),
    /// Some attempt may have reached the cluster
    Undetermined(CollectError),
}
