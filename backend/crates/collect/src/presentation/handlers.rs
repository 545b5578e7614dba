//! HTTP Handlers

use std::sync::Arc;

use auth::{Authenticated, SessionIssuer};
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRef, Path, State};
use axum::response::Response;
use kernel::error::app_error::{AppError, AppResult, ResultExt};
use kernel::error::kind::ErrorKind;
use kernel::id::PostId;
use kernel::response::RequestId;
use kernel::time::Clock;
use platform::client::ClientIp;
use platform::rate_limit::RateLimitStore;

use crate::application::{
    CheckStatusUseCase, CollectConfig, CollectRateLimiter, ConfirmationTracker,
    PrepareCollectInput, PrepareCollectUseCase,
};
use crate::domain::chain::ChainGateway;
use crate::domain::repository::{CollectionRepository, PostRepository};
use crate::error::CollectError;
use crate::presentation::dto::{CollectRequest, CollectResponse, CollectStatusResponse};

/// Shared state for collect handlers
pub struct CollectAppState<R, L, G>
where
    R: CollectionRepository,
    L: RateLimitStore,
    G: ChainGateway,
{
    pub repo: Arc<R>,
    pub limiter: Arc<CollectRateLimiter<L>>,
    pub chain: Arc<G>,
    pub tracker: Arc<ConfirmationTracker<R, G>>,
    pub config: Arc<CollectConfig>,
    pub sessions: Arc<SessionIssuer>,
    pub clock: Arc<dyn Clock>,
}

impl<R, L, G> CollectAppState<R, L, G>
where
    R: CollectionRepository,
    L: RateLimitStore,
    G: ChainGateway,
{
    pub fn new(
        repo: R,
        rate_limits: L,
        chain: G,
        config: CollectConfig,
        sessions: Arc<SessionIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let repo = Arc::new(repo);
        let chain = Arc::new(chain);
        let config = Arc::new(config);
        let limiter = Arc::new(CollectRateLimiter::new(Arc::new(rate_limits), &config));
        let tracker = Arc::new(ConfirmationTracker::new(
            repo.clone(),
            chain.clone(),
            config.clone(),
            clock.clone(),
        ));
        Self {
            repo,
            limiter,
            chain,
            tracker,
            config,
            sessions,
            clock,
        }
    }
}

impl<R, L, G> Clone for CollectAppState<R, L, G>
where
    R: CollectionRepository,
    L: RateLimitStore,
    G: ChainGateway,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            limiter: self.limiter.clone(),
            chain: self.chain.clone(),
            tracker: self.tracker.clone(),
            config: self.config.clone(),
            sessions: self.sessions.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R, L, G> FromRef<CollectAppState<R, L, G>> for Arc<SessionIssuer>
where
    R: CollectionRepository,
    L: RateLimitStore,
    G: ChainGateway,
{
    fn from_ref(state: &CollectAppState<R, L, G>) -> Self {
        state.sessions.clone()
    }
}

// ============================================================================
// Collect
// ============================================================================

/// POST /api/collect/{post_id}
pub async fn collect<R, L, G>(
    rid: RequestId,
    State(state): State<CollectAppState<R, L, G>>,
    user: Authenticated,
    client: ClientIp,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Response
where
    R: CollectionRepository + PostRepository + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
    G: ChainGateway + Send + Sync + 'static,
{
    let result: AppResult<CollectResponse> = async {
        let Path(raw_post_id) = path?;
        let post_id = raw_post_id
            .trim()
            .parse::<PostId>()
            .map_app_err(ErrorKind::Validation, "Invalid post id")?;

        let req = if body.iter().all(u8::is_ascii_whitespace) {
            CollectRequest::default()
        } else {
            let Json(req) = Json::<CollectRequest>::from_bytes(&body)?;
            req
        };
        let mismatched = req
            .wallet_address
            .as_deref()
            .is_some_and(|wallet| wallet.trim() != user.wallet_address);
        if mismatched {
            return Err(AppError::validation(
                "walletAddress does not match the signed-in wallet",
            ));
        }

        let use_case = PrepareCollectUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.limiter.clone(),
            state.chain.clone(),
            state.config.clone(),
            state.clock.clone(),
        );
        let outcome = use_case
            .execute(PrepareCollectInput {
                post_id,
                user_id: user.user_id,
                wallet_address: user.wallet_address.clone(),
                client,
            })
            .await?;

        Ok(outcome.into())
    }
    .await;

    rid.respond(result)
}

// ============================================================================
// Status
// ============================================================================

/// GET /api/collect-status/{collection_id}
pub async fn collect_status<R, L, G>(
    rid: RequestId,
    State(state): State<CollectAppState<R, L, G>>,
    client: ClientIp,
    path: Result<Path<String>, PathRejection>,
) -> Response
where
    R: CollectionRepository + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
    G: ChainGateway + Send + Sync + 'static,
{
    let result: AppResult<CollectStatusResponse> = async {
        state
            .limiter
            .check_status_poll(&client, state.clock.now())
            .await?;

        // Undecodable ids are as unknown as malformed ones
        let Path(collection_id) = path.map_err(|_| CollectError::CollectionNotFound)?;

        let use_case = CheckStatusUseCase::new(state.repo.clone(), state.tracker.clone());
        let output = use_case.execute(&collection_id).await?;

        Ok(output.into())
    }
    .await;

    rid.respond(result)
}
