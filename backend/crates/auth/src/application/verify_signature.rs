//! Verify Signature Use Case
//!
//! Turns a signed challenge into a session. The challenge is consumed before
//! any check runs, so every attempt (successful or not) burns it.

use std::sync::Arc;

use kernel::time::Clock;

use crate::application::session::{SessionIssuer, SessionToken};
use crate::domain::entity::user::{MAX_WALLET_NAME_LEN, User};
use crate::domain::repository::{ChallengeRepository, UserRepository};
use crate::domain::services::verify_wallet_signature;
use crate::domain::value_object::challenge_message::ChallengeMessage;
use crate::domain::value_object::wallet_address::WalletAddress;
use crate::error::{AuthError, AuthResult};

/// Verify signature input
pub struct VerifySignatureInput {
    pub wallet_address: String,
    /// base58 (or base64) detached Ed25519 signature
    pub signature: String,
    /// Exact challenge text that was signed
    pub message: String,
    /// Wallet label reported by the client, if any
    pub wallet_name: Option<String>,
}

/// Verify signature output
#[derive(Debug)]
pub struct VerifySignatureOutput {
    pub session: SessionToken,
    pub user: User,
    pub is_new_user: bool,
}

/// Verify Signature Use Case
pub struct VerifySignatureUseCase<C, U>
where
    C: ChallengeRepository,
    U: UserRepository,
{
    challenge_repo: Arc<C>,
    user_repo: Arc<U>,
    sessions: Arc<SessionIssuer>,
    clock: Arc<dyn Clock>,
}

impl<C, U> VerifySignatureUseCase<C, U>
where
    C: ChallengeRepository,
    U: UserRepository,
{
    pub fn new(
        challenge_repo: Arc<C>,
        user_repo: Arc<U>,
        sessions: Arc<SessionIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            challenge_repo,
            user_repo,
            sessions,
            clock,
        }
    }

    pub async fn execute(&self, input: VerifySignatureInput) -> AuthResult<VerifySignatureOutput> {
        let now = self.clock.now();
        let embedded = ChallengeMessage::parse(&input.message).ok_or(AuthError::ChallengeInvalid)?;

        // Burned before any other check; every attempt costs a challenge
        let challenge = self
            .challenge_repo
            .consume(&embedded.nonce, now)
            .await?
            .ok_or(AuthError::ChallengeInvalid)?;

        let wallet = WalletAddress::parse(&input.wallet_address)?;
        let wallet_name = normalize_wallet_name(input.wallet_name)?;

        if challenge.is_expired(now) {
            return Err(AuthError::ChallengeExpired);
        }
        if challenge.message != input.message
            || challenge.wallet_address != wallet
            || embedded.wallet_address != wallet.as_str()
        {
            return Err(AuthError::ChallengeMismatch);
        }

        verify_wallet_signature(&wallet, input.message.as_bytes(), &input.signature)?;

        let (user, is_new_user) = self
            .user_repo
            .find_or_create(&User::new(wallet, wallet_name, now))
            .await?;
        let session = self
            .sessions
            .issue(&user.user_id, user.wallet_address.as_str())?;

        tracing::info!(
            public_id = %user.public_id,
            wallet = %user.wallet_address,
            is_new_user,
            "Wallet signed in"
        );

        Ok(VerifySignatureOutput {
            session,
            user,
            is_new_user,
        })
    }
}

fn normalize_wallet_name(name: Option<String>) -> AuthResult<Option<String>> {
    let Some(name) = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if name.chars().count() > MAX_WALLET_NAME_LEN {
        return Err(AuthError::Validation(format!(
            "walletName must be at most {MAX_WALLET_NAME_LEN} characters"
        )));
    }
    Ok(Some(name))
}
