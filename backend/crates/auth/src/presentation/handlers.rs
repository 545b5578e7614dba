//! HTTP Handlers
//!
//! Every handler answers through [`RequestId::respond`], so successes and
//! failures share the `{success, data | error, requestId}` envelope.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, State};
use axum::response::Response;
use kernel::error::app_error::AppResult;
use kernel::response::{ApiResponse, RequestId};
use kernel::time::Clock;
use platform::client::ClientIp;
use platform::rate_limit::RateLimitStore;

use crate::application::config::AuthConfig;
use crate::application::session::SessionIssuer;
use crate::application::{
    GenerateChallengeUseCase, VerifySignatureInput, VerifySignatureUseCase,
};
use crate::domain::repository::{ChallengeRepository, UserRepository};
use crate::presentation::dto::{
    ChallengeRequest, ChallengeResponse, SessionResponse, VerifyRequest, VerifyResponse,
};
use crate::presentation::guard::Authenticated;

/// Shared state for auth handlers
pub struct AuthAppState<R, L> {
    pub repo: Arc<R>,
    pub rate_limits: Arc<L>,
    pub config: Arc<AuthConfig>,
    pub sessions: Arc<SessionIssuer>,
    pub clock: Arc<dyn Clock>,
}

impl<R, L> AuthAppState<R, L> {
    pub fn new(repo: R, rate_limits: L, config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let sessions = Arc::new(SessionIssuer::new(&config, clock.clone()));
        Self {
            repo: Arc::new(repo),
            rate_limits: Arc::new(rate_limits),
            config: Arc::new(config),
            sessions,
            clock,
        }
    }
}

impl<R, L> Clone for AuthAppState<R, L> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            rate_limits: self.rate_limits.clone(),
            config: self.config.clone(),
            sessions: self.sessions.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R, L> FromRef<AuthAppState<R, L>> for Arc<SessionIssuer> {
    fn from_ref(state: &AuthAppState<R, L>) -> Self {
        state.sessions.clone()
    }
}

// ============================================================================
// Challenge
// ============================================================================

/// POST /api/auth/challenge
pub async fn challenge<R, L>(
    rid: RequestId,
    State(state): State<AuthAppState<R, L>>,
    client: ClientIp,
    payload: Result<Json<ChallengeRequest>, JsonRejection>,
) -> Response
where
    R: ChallengeRepository + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let result: AppResult<ChallengeResponse> = async {
        let Json(req) = payload?;

        let use_case = GenerateChallengeUseCase::new(
            state.repo.clone(),
            state.rate_limits.clone(),
            state.config.clone(),
            state.clock.clone(),
        );
        let output = use_case.execute(&req.wallet_address, &client).await?;

        Ok(output.into())
    }
    .await;

    rid.respond(result)
}

// ============================================================================
// Verify
// ============================================================================

/// POST /api/auth/verify
pub async fn verify<R, L>(
    rid: RequestId,
    State(state): State<AuthAppState<R, L>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Response
where
    R: ChallengeRepository + UserRepository + Send + Sync + 'static,
    L: Send + Sync + 'static,
{
    let result: AppResult<VerifyResponse> = async {
        let Json(req) = payload?;

        let use_case = VerifySignatureUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.sessions.clone(),
            state.clock.clone(),
        );
        let output = use_case
            .execute(VerifySignatureInput {
                wallet_address: req.wallet_address,
                signature: req.signature,
                message: req.message,
                wallet_name: req.wallet_name,
            })
            .await?;

        Ok(output.into())
    }
    .await;

    rid.respond(result)
}

// ============================================================================
// Session
// ============================================================================

/// GET /api/auth/session
pub async fn session(rid: RequestId, user: Authenticated) -> ApiResponse<SessionResponse> {
    rid.ok(SessionResponse {
        user_id: user.user_id.to_string(),
        wallet_address: user.wallet_address.clone(),
    })
}
