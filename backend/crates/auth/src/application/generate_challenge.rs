//! Generate Challenge Use Case

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::time::Clock;
use platform::client::ClientIp;
use platform::rate_limit::RateLimitStore;

use crate::application::config::AuthConfig;
use crate::domain::entity::challenge::Challenge;
use crate::domain::repository::ChallengeRepository;
use crate::domain::value_object::wallet_address::WalletAddress;
use crate::error::{AuthError, AuthResult};

/// Output DTO for generate challenge
#[derive(Debug, Clone)]
pub struct GenerateChallengeOutput {
    pub message: String,
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate Challenge Use Case
pub struct GenerateChallengeUseCase<C, L>
where
    C: ChallengeRepository,
    L: RateLimitStore,
{
    challenge_repo: Arc<C>,
    rate_limits: Arc<L>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<C, L> GenerateChallengeUseCase<C, L>
where
    C: ChallengeRepository,
    L: RateLimitStore,
{
    pub fn new(
        challenge_repo: Arc<C>,
        rate_limits: Arc<L>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            challenge_repo,
            rate_limits,
            config,
            clock,
        }
    }

    pub async fn execute(
        &self,
        wallet_address: &str,
        client: &ClientIp,
    ) -> AuthResult<GenerateChallengeOutput> {
        let wallet = WalletAddress::parse(wallet_address)?;
        let now = self.clock.now();

        let decision = self
            .rate_limits
            .try_acquire(&self.config.challenge_rate_rule(), &client.identity(), now)
            .await?;
        if !decision.allowed {
            return Err(AuthError::RateLimited);
        }

        let challenge = Challenge::issue(
            &self.config.domain,
            wallet,
            self.config.challenge_ttl_chrono(),
            now,
        );
        self.challenge_repo.create(&challenge).await?;

        tracing::info!(
            wallet = %challenge.wallet_address,
            expires_at = %challenge.expires_at,
            "Issued sign-in challenge"
        );

        Ok(GenerateChallengeOutput {
            message: challenge.message,
            nonce: challenge.nonce,
            expires_at: challenge.expires_at,
        })
    }
}
