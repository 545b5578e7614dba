//! User Entity
//!
//! Canonical identity of a wallet-authenticated user. The wallet address is
//! the immutable anchor; everything else may change.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{public_id::PublicId, wallet_address::WalletAddress};

/// Upper bound on the wallet label some wallets report ("Phantom", ...)
pub const MAX_WALLET_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: PublicId,
    pub wallet_address: WalletAddress,
    pub wallet_name: Option<String>,
    /// Last successful wallet verification
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Candidate for a first login at `now`
    pub fn new(
        wallet_address: WalletAddress,
        wallet_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: UserId::new(),
            public_id: PublicId::new(),
            wallet_address,
            wallet_name,
            last_login_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record successful login
    pub fn record_login(&mut self, wallet_name: Option<String>, now: DateTime<Utc>) {
        if wallet_name.is_some() {
            self.wallet_name = wallet_name;
        }
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}
