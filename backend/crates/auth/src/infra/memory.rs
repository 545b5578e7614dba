//! In-memory repository
//!
//! Same contract as [`PgAuthRepository`](super::postgres::PgAuthRepository),
//! held in process memory. Used by tests and local experiments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::domain::entity::{challenge::Challenge, user::User};
use crate::domain::repository::{ChallengeRepository, UserRepository};
use crate::error::AuthResult;

#[derive(Default)]
struct State {
    challenges: HashMap<String, Challenge>,
    /// keyed by wallet address
    users: HashMap<String, User>,
}

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn challenge(&self, nonce: &str) -> Option<Challenge> {
        self.lock().challenges.get(nonce).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }
}

impl ChallengeRepository for MemoryAuthRepository {
    async fn create(&self, challenge: &Challenge) -> AuthResult<()> {
        self.lock()
            .challenges
            .insert(challenge.nonce.clone(), challenge.clone());
        Ok(())
    }

    async fn consume(&self, nonce: &str, now: DateTime<Utc>) -> AuthResult<Option<Challenge>> {
        let mut state = self.lock();
        let Some(challenge) = state.challenges.get_mut(nonce) else {
            return Ok(None);
        };
        if challenge.is_consumed() {
            return Ok(None);
        }
        challenge.consumed_at = Some(now);
        Ok(Some(challenge.clone()))
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn find_or_create(&self, candidate: &User) -> AuthResult<(User, bool)> {
        let mut state = self.lock();
        match state.users.get_mut(candidate.wallet_address.as_str()) {
            Some(existing) => {
                existing.record_login(
                    candidate.wallet_name.clone(),
                    candidate.last_login_at.unwrap_or(candidate.updated_at),
                );
                Ok((existing.clone(), false))
            }
            None => {
                state
                    .users
                    .insert(candidate.wallet_address.as_str().to_string(), candidate.clone());
                Ok((candidate.clone(), true))
            }
        }
    }
}
