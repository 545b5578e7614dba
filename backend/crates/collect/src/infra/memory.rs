//! In-memory repository
//!
//! Same contract as [`PgCollectRepository`](super::postgres::PgCollectRepository),
//! including the one-active-row-per-pair rule. Used by tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use kernel::id::{CollectionId, PostId, UserId};

use crate::domain::entities::{CollectiblePost, CollectionRequest, CollectionStatus, Transition};
use crate::domain::repository::{CollectionRepository, PostRepository};
use crate::error::CollectResult;

#[derive(Default)]
struct State {
    posts: HashMap<PostId, CollectiblePost>,
    /// insertion order
    collections: Vec<CollectionRequest>,
}

#[derive(Clone, Default)]
pub struct MemoryCollectRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryCollectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_post(&self, post: CollectiblePost) {
        self.lock().posts.insert(post.post_id, post);
    }

    /// All rows for a pair, failed ones included
    pub fn requests_for(&self, post_id: &PostId, user_id: &UserId) -> Vec<CollectionRequest> {
        self.lock()
            .collections
            .iter()
            .filter(|r| r.post_id == *post_id && r.user_id == *user_id)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.lock().collections.len()
    }

    /// Backdate a row so the sweep grace period has passed
    pub fn set_created_at(&self, id: &CollectionId, at: DateTime<Utc>) {
        if let Some(row) = self.lock().collections.iter_mut().find(|r| r.id == *id) {
            row.created_at = at;
        }
    }
}

impl CollectionRepository for MemoryCollectRepository {
    async fn find_active(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> CollectResult<Option<CollectionRequest>> {
        Ok(self
            .lock()
            .collections
            .iter()
            .find(|r| {
                r.post_id == *post_id
                    && r.user_id == *user_id
                    && r.status != CollectionStatus::Failed
            })
            .cloned())
    }

    async fn insert_or_fetch(
        &self,
        request: &CollectionRequest,
    ) -> CollectResult<(CollectionRequest, bool)> {
        let mut state = self.lock();
        let winner = state.collections.iter().find(|r| {
            r.post_id == request.post_id
                && r.user_id == request.user_id
                && r.status != CollectionStatus::Failed
        });
        if let Some(winner) = winner {
            return Ok((winner.clone(), false));
        }
        state.collections.push(request.clone());
        Ok((request.clone(), true))
    }

    async fn find_by_id(&self, id: &CollectionId) -> CollectResult<Option<CollectionRequest>> {
        Ok(self
            .lock()
            .collections
            .iter()
            .find(|r| r.id == *id)
            .cloned())
    }

    async fn transition(
        &self,
        id: &CollectionId,
        transition: &Transition,
        now: DateTime<Utc>,
    ) -> CollectResult<Option<CollectionRequest>> {
        let mut state = self.lock();
        let Some(row) = state.collections.iter_mut().find(|r| r.id == *id) else {
            return Ok(None);
        };
        Ok(row.apply(transition, now).then(|| row.clone()))
    }

    async fn list_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: u32,
    ) -> CollectResult<Vec<CollectionRequest>> {
        let mut pending: Vec<CollectionRequest> = self
            .lock()
            .collections
            .iter()
            .filter(|r| r.is_pending() && r.created_at < created_before)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }
}

impl PostRepository for MemoryCollectRepository {
    async fn find_post(&self, post_id: &PostId) -> CollectResult<Option<CollectiblePost>> {
        Ok(self.lock().posts.get(post_id).cloned())
    }
}
