//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{CollectionId, PostId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{CollectiblePost, CollectionRequest, Transition};
use crate::domain::repository::{CollectionRepository, PostRepository};
use crate::error::{CollectError, CollectResult};

/// A conflicting row can turn `failed` between our insert and the follow-up
/// read; retry the pair this many times before giving up.
const INSERT_ATTEMPTS: usize = 3;

const COLLECTION_COLUMNS: &str = r#"
    collection_id,
    post_id,
    user_id,
    wallet_address,
    status,
    tx_signature,
    asset_id,
    serialized_tx,
    last_valid_block_height,
    failure_reason,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed collect repository
#[derive(Clone)]
pub struct PgCollectRepository {
    pool: PgPool,
}

impl PgCollectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count pending rows, logged at startup
    pub async fn count_pending(&self) -> CollectResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM collection_requests WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn try_insert(
        &self,
        request: &CollectionRequest,
    ) -> CollectResult<Option<CollectionRequest>> {
        // Conflict target matches the partial unique index on non-failed rows
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            r#"
            INSERT INTO collection_requests ({COLLECTION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (post_id, user_id) WHERE status <> 'failed' DO NOTHING
            RETURNING {COLLECTION_COLUMNS}
            "#
        ))
        .bind(request.id.as_uuid())
        .bind(request.post_id.as_uuid())
        .bind(request.user_id.as_uuid())
        .bind(&request.wallet_address)
        .bind(request.status.as_str())
        .bind(&request.tx_signature)
        .bind(request.asset_id.as_deref())
        .bind(&request.serialized_tx)
        .bind(block_height_to_db(request.last_valid_block_height))
        .bind(request.failure_reason.as_deref())
        .bind(request.created_at)
        .bind(request.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CollectionRow::into_request).transpose()
    }
}

// ============================================================================
// Collection Repository Implementation
// ============================================================================

impl CollectionRepository for PgCollectRepository {
    async fn find_active(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> CollectResult<Option<CollectionRequest>> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            r#"
            SELECT {COLLECTION_COLUMNS}
            FROM collection_requests
            WHERE post_id = $1 AND user_id = $2 AND status <> 'failed'
            LIMIT 1
            "#
        ))
        .bind(post_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CollectionRow::into_request).transpose()
    }

    async fn insert_or_fetch(
        &self,
        request: &CollectionRequest,
    ) -> CollectResult<(CollectionRequest, bool)> {
        for _ in 0..INSERT_ATTEMPTS {
            if let Some(stored) = self.try_insert(request).await? {
                return Ok((stored, true));
            }
            if let Some(winner) = self.find_active(&request.post_id, &request.user_id).await? {
                return Ok((winner, false));
            }
        }
        Err(CollectError::Internal(format!(
            "collection insert for post {} kept conflicting",
            request.post_id
        )))
    }

    async fn find_by_id(&self, id: &CollectionId) -> CollectResult<Option<CollectionRequest>> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collection_requests WHERE collection_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CollectionRow::into_request).transpose()
    }

    async fn transition(
        &self,
        id: &CollectionId,
        transition: &Transition,
        now: DateTime<Utc>,
    ) -> CollectResult<Option<CollectionRequest>> {
        let (asset_id, failure_reason) = match transition {
            Transition::Confirmed { asset_id } => (asset_id.as_deref(), None),
            Transition::Failed { reason } => (None, Some(reason.as_str())),
        };

        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            r#"
            UPDATE collection_requests
            SET status = $2,
                asset_id = COALESCE($3, asset_id),
                failure_reason = $4,
                updated_at = $5
            WHERE collection_id = $1 AND status = 'pending'
            RETURNING {COLLECTION_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(transition.status().as_str())
        .bind(asset_id)
        .bind(failure_reason)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CollectionRow::into_request).transpose()
    }

    async fn list_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: u32,
    ) -> CollectResult<Vec<CollectionRequest>> {
        let rows = sqlx::query_as::<_, CollectionRow>(&format!(
            r#"
            SELECT {COLLECTION_COLUMNS}
            FROM collection_requests
            WHERE status = 'pending' AND created_at < $1
            ORDER BY created_at
            LIMIT $2
            "#
        ))
        .bind(created_before)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CollectionRow::into_request).collect()
    }
}

// ============================================================================
// Post Repository Implementation
// ============================================================================

impl PostRepository for PgCollectRepository {
    async fn find_post(&self, post_id: &PostId) -> CollectResult<Option<CollectiblePost>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                p.post_id,
                p.post_type,
                (p.deleted_at IS NOT NULL) AS deleted,
                u.wallet_address AS creator_wallet,
                p.title,
                p.metadata_uri
            FROM posts p
            LEFT JOIN users u ON u.user_id = p.creator_user_id
            WHERE p.post_id = $1
            "#,
        )
        .bind(post_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PostRow::into_post))
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

fn block_height_to_db(height: u64) -> i64 {
    i64::try_from(height).unwrap_or(i64::MAX)
}

#[derive(sqlx::FromRow)]
struct CollectionRow {
    collection_id: Uuid,
    post_id: Uuid,
    user_id: Uuid,
    wallet_address: String,
    status: String,
    tx_signature: String,
    asset_id: Option<String>,
    serialized_tx: String,
    last_valid_block_height: i64,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CollectionRow {
    fn into_request(self) -> CollectResult<CollectionRequest> {
        Ok(CollectionRequest {
            id: CollectionId::from_uuid(self.collection_id),
            post_id: PostId::from_uuid(self.post_id),
            user_id: UserId::from_uuid(self.user_id),
            wallet_address: self.wallet_address,
            status: self.status.parse().map_err(CollectError::Internal)?,
            tx_signature: self.tx_signature,
            asset_id: self.asset_id,
            serialized_tx: self.serialized_tx,
            last_valid_block_height: u64::try_from(self.last_valid_block_height).unwrap_or(0),
            failure_reason: self.failure_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    post_id: Uuid,
    post_type: String,
    deleted: bool,
    creator_wallet: Option<String>,
    title: String,
    metadata_uri: Option<String>,
}

impl PostRow {
    fn into_post(self) -> CollectiblePost {
        CollectiblePost {
            post_id: PostId::from_uuid(self.post_id),
            post_type: self.post_type,
            deleted: self.deleted,
            creator_wallet: self.creator_wallet,
            title: self.title,
            metadata_uri: self.metadata_uri,
        }
    }
}
