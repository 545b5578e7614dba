//! Rate Limiting Infrastructure
//!
//! Fixed-window counters keyed by `(scope, identity, window_start)`.
//! Windows are aligned to the Unix epoch, so a 24h window rolls over at
//! midnight UTC.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use kernel::error::app_error::AppError;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// One counter definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Namespace of the counter, e.g. `collect:user:daily`
    pub scope: String,
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl RateLimitRule {
    pub fn new(scope: impl Into<String>, max_requests: u32, window: Duration) -> Self {
        Self {
            scope: scope.into(),
            max_requests,
            window,
        }
    }

    /// Rule resetting at midnight UTC
    pub fn daily(scope: impl Into<String>, max_requests: u32) -> Self {
        Self::new(scope, max_requests, DAY)
    }

    pub fn window_ms(&self) -> i64 {
        (self.window.as_millis() as i64).max(1)
    }

    /// Start of the window containing `now`
    pub fn window_start_ms(&self, now: DateTime<Utc>) -> i64 {
        let window_ms = self.window_ms();
        now.timestamp_millis().div_euclid(window_ms) * window_ms
    }

    pub fn reset_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let reset_ms = self.window_start_ms(now) + self.window_ms();
        DateTime::<Utc>::from_timestamp_millis(reset_ms).unwrap_or(now)
    }
}

/// Outcome of one acquire attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Counter value after this attempt (unchanged when denied)
    pub count: u32,
    pub limit: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit store error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        AppError::internal("Rate limit store unavailable").with_source(err)
    }
}

/// Trait for rate limit storage backends
///
/// `try_acquire` increments the counter only while it is below the rule's
/// limit, in a single atomic step. A denied attempt leaves the counter as is.
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    async fn try_acquire(
        &self,
        rule: &RateLimitRule,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitError>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

/// PostgreSQL-backed counters (`rate_limit_counters`)
#[derive(Clone)]
pub struct PgRateLimitStore {
    pool: PgPool,
}

impl PgRateLimitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete counters whose window started before `older_than`
    pub async fn cleanup_expired(&self, older_than: DateTime<Utc>) -> Result<u64, RateLimitError> {
        let deleted = sqlx::query("DELETE FROM rate_limit_counters WHERE window_start_ms < $1")
            .bind(older_than.timestamp_millis())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(rate_limits = deleted, "Cleaned up expired rate limit counters");
        Ok(deleted)
    }
}

impl RateLimitStore for PgRateLimitStore {
    async fn try_acquire(
        &self,
        rule: &RateLimitRule,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let window_start = rule.window_start_ms(now);
        let reset_at = rule.reset_at(now);

        if rule.max_requests == 0 {
            return Ok(RateLimitDecision {
                allowed: false,
                count: 0,
                limit: 0,
                reset_at,
            });
        }

        // The WHERE on the conflict arm makes the row untouched (and RETURNING
        // empty) once the limit is reached.
        let count = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO rate_limit_counters (scope, identity, window_start_ms, request_count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (scope, identity, window_start_ms)
            DO UPDATE SET request_count = rate_limit_counters.request_count + 1
            WHERE rate_limit_counters.request_count < $4
            RETURNING request_count
            "#,
        )
        .bind(&rule.scope)
        .bind(identity)
        .bind(window_start)
        .bind(rule.max_requests as i32)
        .fetch_optional(&self.pool)
        .await?;

        let decision = match count {
            Some(count) => RateLimitDecision {
                allowed: true,
                count: count.max(0) as u32,
                limit: rule.max_requests,
                reset_at,
            },
            None => RateLimitDecision {
                allowed: false,
                count: rule.max_requests,
                limit: rule.max_requests,
                reset_at,
            },
        };

        if !decision.allowed {
            tracing::warn!(
                scope = %rule.scope,
                identity = identity,
                max = rule.max_requests,
                "Rate limit exceeded"
            );
        }

        Ok(decision)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local counters, for tests and single-node development
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    counters: Mutex<HashMap<(String, String, i64), u32>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter (0 when absent)
    pub fn count(&self, rule: &RateLimitRule, identity: &str, now: DateTime<Utc>) -> u32 {
        let counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counters
            .get(&(rule.scope.clone(), identity.to_string(), rule.window_start_ms(now)))
            .copied()
            .unwrap_or(0)
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn try_acquire(
        &self,
        rule: &RateLimitRule,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let key = (
            rule.scope.clone(),
            identity.to_string(),
            rule.window_start_ms(now),
        );
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let count = counters.entry(key).or_insert(0);
        let allowed = *count < rule.max_requests;
        if allowed {
            *count += 1;
        }

        Ok(RateLimitDecision {
            allowed,
            count: *count,
            limit: rule.max_requests,
            reset_at: rule.reset_at(now),
        })
    }
}
