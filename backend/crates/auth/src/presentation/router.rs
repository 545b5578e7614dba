//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};
use platform::rate_limit::{PgRateLimitStore, RateLimitStore};

use crate::domain::repository::{ChallengeRepository, UserRepository};
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router with PostgreSQL storage
pub fn auth_router(state: AuthAppState<PgAuthRepository, PgRateLimitStore>) -> Router {
    auth_router_generic(state)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R, L>(state: AuthAppState<R, L>) -> Router
where
    R: ChallengeRepository + UserRepository + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    Router::new()
        .route("/challenge", post(handlers::challenge::<R, L>))
        .route("/verify", post(handlers::verify::<R, L>))
        .route("/session", get(handlers::session))
        .with_state(state)
}
