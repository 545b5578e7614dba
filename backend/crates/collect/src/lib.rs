//! Collect (Free Collectible Issuance) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Collection requests, the chain gateway port, repository traits
//! - `application/` - Prepare/status use cases, rate limiter, confirmation tracker
//! - `infra/` - PostgreSQL and in-memory repositories, Bubblegum mint builder,
//!   Solana gateway
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Flow
//! 1. `POST /collect/{post_id}` (bearer) checks the post, returns the existing
//!    request for the (post, user) pair if there is one, applies the burst,
//!    per-user and per-IP caps, then builds a compressed-NFT mint signed by
//!    the platform authority.
//! 2. The request row is stored as `pending` before the transaction is sent.
//! 3. `GET /collect-status/{collection_id}` and the background sweep move
//!    pending rows to `confirmed` (with the asset id) or `failed`.
//!
//! A `failed` row does not block a new attempt for the same pair.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::CollectConfig;
pub use application::confirmation::{ConfirmationTracker, SweepReport};
pub use error::{CollectError, CollectResult};
pub use infra::{
    MemoryCollectRepository, MintConfig, PgCollectRepository, SolanaChainGateway,
};
pub use presentation::handlers::CollectAppState;
pub use presentation::router::{collect_router, collect_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::presentation::dto::*;
}
