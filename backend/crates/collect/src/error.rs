//! Collect Error Types
//!
//! Collect-specific variants that fold into the unified `kernel::error::AppError`.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::RateLimitError;
use platform::solana::RpcError;
use thiserror::Error;

/// Collect-specific result type alias
pub type CollectResult<T> = Result<T, CollectError>;

/// Collect-specific error variants
#[derive(Debug, Error)]
pub enum CollectError {
    /// Post missing or deleted
    #[error("Post not found")]
    PostNotFound,

    /// Post exists but cannot be collected
    #[error("Post is not a collectible")]
    NotCollectible,

    /// Unknown or malformed collection id
    #[error("Collection not found")]
    CollectionNotFound,

    /// Caller-fixable input problem
    #[error("{0}")]
    Validation(String),

    /// One of the collect counters is exhausted
    #[error("Collect limit reached, try again later")]
    RateLimited { scope: String },

    /// Chain RPC call failed
    #[error("Chain RPC error: {0}")]
    Chain(#[from] RpcError),

    /// Every broadcast attempt failed
    #[error("Transaction broadcast failed after {attempts} attempts")]
    BroadcastFailed { attempts: u32 },

    /// Mint transaction could not be assembled
    #[error("Mint build error: {0}")]
    MintBuild(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Rate-limit backend error
    #[error(transparent)]
    RateLimitStore(#[from] RateLimitError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CollectError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectError::PostNotFound | CollectError::CollectionNotFound => ErrorKind::NotFound,
            CollectError::NotCollectible | CollectError::Validation(_) => ErrorKind::Validation,
            CollectError::RateLimited { .. } => ErrorKind::RateLimited,
            CollectError::Chain(_) | CollectError::BroadcastFailed { .. } => ErrorKind::Upstream,
            CollectError::MintBuild(_)
            | CollectError::Database(_)
            | CollectError::RateLimitStore(_)
            | CollectError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether another broadcast attempt could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CollectError::Chain(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            CollectError::Database(e) => {
                tracing::error!(error = %e, "Collect database error");
            }
            CollectError::RateLimitStore(e) => {
                tracing::error!(error = %e, "Collect rate limit store error");
            }
            CollectError::MintBuild(msg) | CollectError::Internal(msg) => {
                tracing::error!(message = %msg, "Collect internal error");
            }
            CollectError::Chain(e) => {
                tracing::error!(error = %e, "Chain RPC failure");
            }
            CollectError::BroadcastFailed { attempts } => {
                tracing::error!(attempts, "Mint broadcast gave up");
            }
            CollectError::RateLimited { scope } => {
                tracing::warn!(scope = %scope, "Collect rate limited");
            }
            _ => {
                tracing::debug!(error = %self, "Collect error");
            }
        }
    }
}

impl From<CollectError> for AppError {
    fn from(err: CollectError) -> Self {
        err.log();
        let kind = err.kind();
        match kind {
            ErrorKind::Upstream => {
                AppError::new(kind, "Blockchain network unavailable, try again later")
                    .with_source(err)
            }
            _ if kind.is_server_error() => {
                AppError::new(kind, "Collect backend failure").with_source(err)
            }
            _ => AppError::new(kind, err.to_string()),
        }
    }
}
