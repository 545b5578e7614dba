//! Auth Error Types
//!
//! Auth-specific variants that fold into the unified `kernel::error::AppError`.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::RateLimitError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wallet address failed the base58 / length check
    #[error("Invalid wallet address")]
    InvalidWalletAddress,

    /// Other caller-fixable input problem
    #[error("{0}")]
    Validation(String),

    /// Challenge unknown, already used, or unparseable
    #[error("Challenge not found or already used")]
    ChallengeInvalid,

    /// Challenge TTL elapsed before verification
    #[error("Challenge expired")]
    ChallengeExpired,

    /// Submitted message or wallet differs from what was issued
    #[error("Challenge does not match the issued message")]
    ChallengeMismatch,

    /// Ed25519 verification failed
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// No bearer token on a protected route
    #[error("Authentication required")]
    TokenMissing,

    /// Bearer token malformed, forged or expired
    #[error("Invalid or expired session token")]
    TokenInvalid,

    /// Challenge issuance throttle
    #[error("Too many challenge requests, try again later")]
    RateLimited,

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

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidWalletAddress | AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::ChallengeInvalid
            | AuthError::ChallengeExpired
            | AuthError::ChallengeMismatch
            | AuthError::SignatureInvalid => ErrorKind::SignatureInvalid,
            AuthError::TokenMissing => ErrorKind::AuthRequired,
            AuthError::TokenInvalid => ErrorKind::AuthInvalid,
            AuthError::RateLimited => ErrorKind::RateLimited,
            AuthError::Database(_) | AuthError::RateLimitStore(_) | AuthError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::RateLimitStore(e) => {
                tracing::error!(error = %e, "Auth rate limit store error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::ChallengeInvalid
            | AuthError::ChallengeExpired
            | AuthError::ChallengeMismatch
            | AuthError::SignatureInvalid => {
                tracing::warn!(reason = %self, "Wallet verification rejected");
            }
            AuthError::RateLimited => {
                tracing::warn!("Challenge issuance throttled");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.log();
        let kind = err.kind();
        if kind.is_server_error() {
            AppError::new(kind, "Authentication backend failure").with_source(err)
        } else {
            AppError::new(kind, err.to_string())
        }
    }
}
