//! PostgreSQL Repository Implementations

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{challenge::Challenge, user::User};
use crate::domain::repository::{ChallengeRepository, UserRepository};
use crate::domain::value_object::wallet_address::WalletAddress;
use crate::error::AuthResult;

/// Consumed or expired challenges are kept this long for forensics
const CHALLENGE_RETENTION: Duration = Duration::hours(1);

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired challenges
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let cutoff = Utc::now() - CHALLENGE_RETENTION;

        let deleted = sqlx::query(
            "DELETE FROM wallet_challenges WHERE expires_at < $1 OR consumed_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(challenges_deleted = deleted, "Cleaned up expired wallet challenges");

        Ok(deleted)
    }
}

// ============================================================================
// Challenge Repository Implementation
// ============================================================================

impl ChallengeRepository for PgAuthRepository {
    async fn create(&self, challenge: &Challenge) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO wallet_challenges (
                nonce,
                wallet_address,
                message,
                issued_at,
                expires_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&challenge.nonce)
        .bind(challenge.wallet_address.as_str())
        .bind(&challenge.message)
        .bind(challenge.issued_at)
        .bind(challenge.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume(&self, nonce: &str, now: DateTime<Utc>) -> AuthResult<Option<Challenge>> {
        // Expiry is judged by the caller; consuming an expired row still
        // burns it.
        let row = sqlx::query_as::<_, ChallengeRow>(
            r#"
            UPDATE wallet_challenges
            SET consumed_at = $2
            WHERE nonce = $1 AND consumed_at IS NULL
            RETURNING
                nonce,
                wallet_address,
                message,
                issued_at,
                expires_at,
                consumed_at
            "#,
        )
        .bind(nonce)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_none() {
            tracing::warn!(nonce = %nonce, "Challenge unknown or already consumed");
        }

        Ok(row.map(ChallengeRow::into_challenge))
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn find_or_create(&self, candidate: &User) -> AuthResult<(User, bool)> {
        // xmax is 0 only for a tuple this statement inserted
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                user_id,
                public_id,
                wallet_address,
                wallet_name,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (wallet_address) DO UPDATE SET
                wallet_name = COALESCE(EXCLUDED.wallet_name, users.wallet_name),
                last_login_at = EXCLUDED.last_login_at,
                updated_at = EXCLUDED.updated_at
            RETURNING
                user_id,
                public_id,
                wallet_address,
                wallet_name,
                last_login_at,
                created_at,
                updated_at,
                (xmax = 0) AS inserted
            "#,
        )
        .bind(candidate.user_id.as_uuid())
        .bind(candidate.public_id.as_str())
        .bind(candidate.wallet_address.as_str())
        .bind(candidate.wallet_name.as_deref())
        .bind(candidate.last_login_at)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_one(&self.pool)
        .await?;

        let inserted = row.inserted;
        Ok((row.into_user()?, inserted))
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct ChallengeRow {
    nonce: String,
    wallet_address: String,
    message: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
}

impl ChallengeRow {
    fn into_challenge(self) -> Challenge {
        Challenge {
            nonce: self.nonce,
            wallet_address: WalletAddress::from_db(self.wallet_address),
            message: self.message,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            consumed_at: self.consumed_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    public_id: String,
    wallet_address: String,
    wallet_name: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    inserted: bool,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            public_id: self.public_id.parse()?,
            wallet_address: WalletAddress::from_db(self.wallet_address),
            wallet_name: self.wallet_name,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
