//! Collect Router

use axum::{
    Router,
    routing::{get, post},
};
use platform::rate_limit::{PgRateLimitStore, RateLimitStore};

use crate::domain::chain::ChainGateway;
use crate::domain::repository::{CollectionRepository, PostRepository};
use crate::infra::chain::SolanaChainGateway;
use crate::infra::postgres::PgCollectRepository;
use crate::presentation::handlers::{self, CollectAppState};

/// Create the Collect router with PostgreSQL storage and the Solana gateway
pub fn collect_router(
    state: CollectAppState<PgCollectRepository, PgRateLimitStore, SolanaChainGateway>,
) -> Router {
    collect_router_generic(state)
}

/// Create a generic Collect router for any repository and chain
pub fn collect_router_generic<R, L, G>(state: CollectAppState<R, L, G>) -> Router
where
    R: CollectionRepository + PostRepository + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
    G: ChainGateway + Send + Sync + 'static,
{
    Router::new()
        .route("/collect/{post_id}", post(handlers::collect::<R, L, G>))
        .route(
            "/collect-status/{collection_id}",
            get(handlers::collect_status::<R, L, G>),
        )
        .with_state(state)
}
