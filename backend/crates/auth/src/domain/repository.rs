//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in `infra`.

use chrono::{DateTime, Utc};

use crate::domain::entity::{challenge::Challenge, user::User};
use crate::error::AuthResult;

/// Challenge store
#[trait_variant::make(ChallengeRepository: Send)]
pub trait LocalChallengeRepository {
    /// Store a newly issued challenge
    async fn create(&self, challenge: &Challenge) -> AuthResult<()>;

    /// Mark the challenge consumed and return it, atomically
    ///
    /// Returns `None` when the nonce is unknown or was already consumed, so
    /// two concurrent callers can never both receive the same challenge.
    async fn consume(&self, nonce: &str, now: DateTime<Utc>) -> AuthResult<Option<Challenge>>;
}

/// User directory
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert-or-fetch keyed on the wallet address, stamping the login
    ///
    /// When a user with `candidate.wallet_address` exists, its id, public id
    /// and creation time are kept; only the login time and a supplied wallet
    /// name are refreshed. Returns the stored user and whether it was created.
    async fn find_or_create(&self, candidate: &User) -> AuthResult<(User, bool)>;
}
