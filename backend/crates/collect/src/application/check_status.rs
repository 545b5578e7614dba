//! Check Collection Status Use Case

use std::sync::Arc;

use kernel::id::CollectionId;

use crate::application::confirmation::ConfirmationTracker;
use crate::domain::chain::ChainGateway;
use crate::domain::entities::{CollectionRequest, CollectionStatus};
use crate::domain::repository::CollectionRepository;
use crate::error::{CollectError, CollectResult};

/// Output DTO for check status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStatusOutput {
    pub status: CollectionStatus,
    pub tx_signature: String,
    /// Asset id, only once confirmed
    pub nft_mint: Option<String>,
}

impl From<CollectionRequest> for CollectionStatusOutput {
    fn from(request: CollectionRequest) -> Self {
        let nft_mint = match request.status {
            CollectionStatus::Confirmed => request.asset_id,
            _ => None,
        };
        Self {
            status: request.status,
            tx_signature: request.tx_signature,
            nft_mint,
        }
    }
}

/// Check Status Use Case
pub struct CheckStatusUseCase<C, G>
where
    C: CollectionRepository,
    G: ChainGateway,
{
    collections: Arc<C>,
    tracker: Arc<ConfirmationTracker<C, G>>,
}

impl<C, G> CheckStatusUseCase<C, G>
where
    C: CollectionRepository,
    G: ChainGateway,
{
    pub fn new(collections: Arc<C>, tracker: Arc<ConfirmationTracker<C, G>>) -> Self {
        Self {
            collections,
            tracker,
        }
    }

    /// Malformed and unknown ids are both `CollectionNotFound`
    pub async fn execute(&self, collection_id: &str) -> CollectResult<CollectionStatusOutput> {
        let id: CollectionId = collection_id
            .trim()
            .parse()
            .map_err(|_| CollectError::CollectionNotFound)?;

        let record = self
            .collections
            .find_by_id(&id)
            .await?
            .ok_or(CollectError::CollectionNotFound)?;

        let record = self.tracker.advance(record).await?;
        Ok(record.into())
    }
}
