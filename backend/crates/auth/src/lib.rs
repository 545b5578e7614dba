//! Auth (Wallet Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, signature verification, repository traits
//! - `application/` - Use cases and the session issuer
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router, bearer guard
//!
//! ## Protocol
//! 1. `POST /challenge` issues a single-use, 5-minute message embedding a
//!    random nonce and the caller's wallet address.
//! 2. The wallet signs the message (Ed25519).
//! 3. `POST /verify` consumes the challenge, checks the signature against the
//!    wallet's public key, resolves the user and returns a bearer token.
//!
//! ## Security Model
//! - Challenges are consumed atomically on every verification attempt
//! - Session tokens are HMAC-SHA256 signed and carry their own expiry
//! - Protected routes take the [`Authenticated`] extractor; there is no
//!   other token parsing path

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::session::{AuthenticatedUser, SessionIssuer, SessionToken};
pub use error::{AuthError, AuthResult};
pub use infra::{memory::MemoryAuthRepository, postgres::PgAuthRepository};
pub use presentation::guard::Authenticated;
pub use presentation::handlers::AuthAppState;
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::challenge::*;
    pub use crate::domain::entity::user::*;
    pub use crate::domain::value_object::{
        challenge_message::*, public_id::*, wallet_address::*,
    };
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::postgres::PgAuthRepository as AuthStore;
}

#[cfg(test)]
mod tests;
