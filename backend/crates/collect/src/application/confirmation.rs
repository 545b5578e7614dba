//! Confirmation Tracker
//!
//! Resolves pending collection requests against the chain. Used lazily by
//! status polls and periodically by the background sweep. Every terminal
//! write is conditional on the row still being pending, so a poll and the
//! sweep racing on the same row transition it once.

use std::sync::Arc;

use kernel::time::Clock;

use crate::application::config::CollectConfig;
use crate::domain::chain::{AssetLookup, ChainGateway, SignatureState};
use crate::domain::entities::{CollectionRequest, CollectionStatus, Transition};
use crate::domain::repository::CollectionRepository;
use crate::error::CollectResult;

/// Counters of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub confirmed: usize,
    pub failed: usize,
}

pub struct ConfirmationTracker<C, G>
where
    C: CollectionRepository,
    G: ChainGateway,
{
    collections: Arc<C>,
    chain: Arc<G>,
    config: Arc<CollectConfig>,
    clock: Arc<dyn Clock>,
}

impl<C, G> ConfirmationTracker<C, G>
where
    C: CollectionRepository,
    G: ChainGateway,
{
    pub fn new(
        collections: Arc<C>,
        chain: Arc<G>,
        config: Arc<CollectConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            collections,
            chain,
            config,
            clock,
        }
    }

    /// Move `record` toward a terminal state
    ///
    /// Returns the record as stored afterwards. Chain failures leave it
    /// pending; only database errors are returned.
    pub async fn advance(&self, record: CollectionRequest) -> CollectResult<CollectionRequest> {
        if !record.is_pending() {
            return Ok(record);
        }

        let state = match self.chain.signature_state(&record.tx_signature).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    collection_id = %record.id,
                    error = %e,
                    "Signature status lookup failed, leaving pending"
                );
                return Ok(record);
            }
        };

        match state {
            SignatureState::Failed(reason) => {
                self.finish(record, Transition::failed(format!("transaction failed: {reason}")))
                    .await
            }
            SignatureState::Landed => match self.chain.asset_id(&record.tx_signature).await {
                Ok(AssetLookup::Found(asset_id)) => {
                    self.finish(
                        record,
                        Transition::Confirmed {
                            asset_id: Some(asset_id),
                        },
                    )
                    .await
                }
                Ok(AssetLookup::Missing) => {
                    tracing::warn!(
                        collection_id = %record.id,
                        signature = %record.tx_signature,
                        "Mint landed without a leaf event, asset id unknown"
                    );
                    self.finish(record, Transition::Confirmed { asset_id: None })
                        .await
                }
                Ok(AssetLookup::NotYetAvailable) => Ok(record),
                Err(e) => {
                    tracing::warn!(
                        collection_id = %record.id,
                        error = %e,
                        "Asset id lookup failed, leaving pending"
                    );
                    Ok(record)
                }
            },
            SignatureState::Processing => Ok(record),
            SignatureState::Unknown => self.handle_unknown(record).await,
        }
    }

    async fn handle_unknown(&self, record: CollectionRequest) -> CollectResult<CollectionRequest> {
        let height = match self.chain.block_height().await {
            Ok(height) => height,
            Err(e) => {
                tracing::warn!(
                    collection_id = %record.id,
                    error = %e,
                    "Block height lookup failed, leaving pending"
                );
                return Ok(record);
            }
        };

        if height > record.last_valid_block_height {
            return self
                .finish(record, Transition::failed("blockhash expired"))
                .await;
        }

        // Same bytes, same signature: cannot double-mint
        if let Err(e) = self.chain.broadcast(&record.serialized_tx).await {
            tracing::warn!(
                collection_id = %record.id,
                error = %e,
                "Re-broadcast failed, leaving pending"
            );
        } else {
            tracing::debug!(
                collection_id = %record.id,
                block_height = height,
                last_valid_block_height = record.last_valid_block_height,
                "Re-broadcast pending mint"
            );
        }
        Ok(record)
    }

    async fn finish(
        &self,
        record: CollectionRequest,
        transition: Transition,
    ) -> CollectResult<CollectionRequest> {
        let now = self.clock.now();
        match self
            .collections
            .transition(&record.id, &transition, now)
            .await?
        {
            Some(updated) => {
                match &transition {
                    Transition::Confirmed { asset_id } => tracing::info!(
                        collection_id = %updated.id,
                        signature = %updated.tx_signature,
                        asset_id = asset_id.as_deref().unwrap_or("-"),
                        "Collection confirmed"
                    ),
                    Transition::Failed { reason } => tracing::warn!(
                        collection_id = %updated.id,
                        signature = %updated.tx_signature,
                        reason = %reason,
                        "Collection failed"
                    ),
                }
                Ok(updated)
            }
            // Someone else got there first; report what they stored
            None => Ok(self
                .collections
                .find_by_id(&record.id)
                .await?
                .unwrap_or(record)),
        }
    }

    /// Reconcile pending rows older than the grace period
    pub async fn sweep(&self, limit: u32) -> CollectResult<SweepReport> {
        let cutoff = self.clock.now() - self.config.pending_grace_chrono();
        let pending = self.collections.list_pending(cutoff, limit).await?;

        let mut report = SweepReport {
            examined: pending.len(),
            ..Default::default()
        };
        for record in pending {
            let updated = self.advance(record).await?;
            match updated.status {
                CollectionStatus::Confirmed => report.confirmed += 1,
                CollectionStatus::Failed => report.failed += 1,
                CollectionStatus::Pending => {}
            }
        }

        if report.examined > 0 {
            tracing::info!(
                examined = report.examined,
                confirmed = report.confirmed,
                failed = report.failed,
                "Pending collection sweep"
            );
        }
        Ok(report)
    }
}
