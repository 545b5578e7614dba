//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};
use kernel::id::{CollectionId, PostId, UserId};

use crate::domain::entities::{CollectiblePost, CollectionRequest, Transition};
use crate::error::CollectResult;

/// Collection request repository trait
#[trait_variant::make(CollectionRepository: Send)]
pub trait LocalCollectionRepository {
    /// The pending or confirmed request for a pair, if any
    async fn find_active(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> CollectResult<Option<CollectionRequest>>;

    /// Insert unless a non-failed request exists for the same pair
    ///
    /// Returns the stored row and whether this call inserted it. When another
    /// writer won, the winner's row is returned.
    async fn insert_or_fetch(
        &self,
        request: &CollectionRequest,
    ) -> CollectResult<(CollectionRequest, bool)>;

    async fn find_by_id(&self, id: &CollectionId) -> CollectResult<Option<CollectionRequest>>;

    /// Move a pending request to a terminal state
    ///
    /// `None` when the row was no longer pending.
    async fn transition(
        &self,
        id: &CollectionId,
        transition: &Transition,
        now: DateTime<Utc>,
    ) -> CollectResult<Option<CollectionRequest>>;

    /// Oldest pending requests created before `created_before`
    async fn list_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: u32,
    ) -> CollectResult<Vec<CollectionRequest>>;
}

/// Post directory (read only)
#[trait_variant::make(PostRepository: Send)]
pub trait LocalPostRepository {
    async fn find_post(&self, post_id: &PostId) -> CollectResult<Option<CollectiblePost>>;
}
