//! Challenge Entity
//!
//! Single-use sign-in challenge. Lifecycle: ISSUED → CONSUMED or EXPIRED,
//! never back.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::challenge_message::ChallengeMessage;
use crate::domain::value_object::wallet_address::WalletAddress;

/// Random bytes behind each nonce
pub const NONCE_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// base58 of 32 random bytes; primary key
    pub nonce: String,
    pub wallet_address: WalletAddress,
    /// Exact text the wallet must sign
    pub message: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl Challenge {
    /// Issue a fresh challenge for `wallet_address`
    pub fn issue(
        domain: &str,
        wallet_address: WalletAddress,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let nonce = bs58::encode(platform::crypto::random_array::<NONCE_BYTES>()).into_string();
        let expires_at = now + ttl;
        let message = ChallengeMessage {
            domain: domain.to_string(),
            wallet_address: wallet_address.as_str().to_string(),
            nonce: nonce.clone(),
            issued_at: now,
            expires_at,
        }
        .render();

        Self {
            nonce,
            wallet_address,
            message,
            issued_at: now,
            expires_at,
            consumed_at: None,
        }
    }

    /// Expired strictly after `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM").unwrap()
    }

    #[test]
    fn test_issue_embeds_nonce_and_wallet() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let challenge = Challenge::issue("collect.example", wallet(), Duration::seconds(300), now);

        let parsed = ChallengeMessage::parse(&challenge.message).unwrap();
        assert_eq!(parsed.nonce, challenge.nonce);
        assert_eq!(parsed.wallet_address, wallet().as_str());
        assert_eq!(parsed.expires_at, now + Duration::seconds(300));
        assert_eq!(bs58::decode(&challenge.nonce).into_vec().unwrap().len(), NONCE_BYTES);
        assert!(!challenge.is_consumed());
    }

    #[test]
    fn test_nonces_are_unique() {
        let now = Utc::now();
        let a = Challenge::issue("d", wallet(), Duration::seconds(300), now);
        let b = Challenge::issue("d", wallet(), Duration::seconds(300), now);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let challenge = Challenge::issue("d", wallet(), Duration::seconds(300), now);

        assert!(!challenge.is_expired(now + Duration::seconds(300)));
        assert!(challenge.is_expired(now + Duration::seconds(301)));
    }
}
