//! Session tokens
//!
//! Stateless bearer tokens, verified without touching the database:
//!
//! ```text
//! v1.<base64url(json claims)>.<base64url(HMAC-SHA256(secret, "v1." + claims))>
//! ```
//!
//! Claims are `{sub, wallet, iat, exp}` with Unix-second timestamps.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use kernel::time::Clock;
use platform::crypto::{from_base64url, hmac_sha256, to_base64url, verify_hmac_sha256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

const TOKEN_VERSION: &str = "v1";

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    wallet: String,
    iat: i64,
    exp: i64,
}

/// Freshly issued bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity carried by a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub wallet_address: String,
}

/// Issues and validates session tokens
pub struct SessionIssuer {
    secret: [u8; 32],
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl SessionIssuer {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: config.session_secret,
            ttl: config.session_ttl_chrono(),
            clock,
        }
    }

    pub fn issue(&self, user_id: &UserId, wallet_address: &str) -> AuthResult<SessionToken> {
        let now = self.clock.now();
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: *user_id.as_uuid(),
            wallet: wallet_address.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let payload = serde_json::to_vec(&claims)
            .map_err(|e| AuthError::Internal(format!("Failed to encode session claims: {e}")))?;
        let signed_part = format!("{TOKEN_VERSION}.{}", to_base64url(&payload));
        let mac = hmac_sha256(&self.secret, signed_part.as_bytes());

        Ok(SessionToken {
            token: format!("{signed_part}.{}", to_base64url(&mac)),
            expires_at: DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    /// Validate a bearer token
    ///
    /// `None` or a blank token is `TokenMissing`; anything else that fails is
    /// `TokenInvalid`. Never panics on hostile input.
    pub fn authenticate(&self, token: Option<&str>) -> AuthResult<AuthenticatedUser> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::TokenMissing)?;

        let (signed_part, mac) = token.rsplit_once('.').ok_or(AuthError::TokenInvalid)?;
        let (version, payload) = signed_part
            .split_once('.')
            .ok_or(AuthError::TokenInvalid)?;
        if version != TOKEN_VERSION {
            return Err(AuthError::TokenInvalid);
        }

        let mac = from_base64url(mac).map_err(|_| AuthError::TokenInvalid)?;
        if !verify_hmac_sha256(&self.secret, signed_part.as_bytes(), &mac) {
            return Err(AuthError::TokenInvalid);
        }

        let payload = from_base64url(payload).map_err(|_| AuthError::TokenInvalid)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::TokenInvalid)?;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(AuthError::TokenInvalid);
        }

        Ok(AuthenticatedUser {
            user_id: UserId::from_uuid(claims.sub),
            wallet_address: claims.wallet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kernel::time::ManualClock;

    const WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    fn issuer(clock: Arc<ManualClock>) -> SessionIssuer {
        SessionIssuer::new(&AuthConfig::with_random_secret(), clock)
    }

    #[test]
    fn test_issue_then_authenticate() {
        let clock = Arc::new(ManualClock::starting_at_epoch_secs(1_770_000_000));
        let sessions = issuer(clock.clone());
        let user_id = UserId::new();

        let session = sessions.issue(&user_id, WALLET).unwrap();
        assert!(session.token.starts_with("v1."));
        assert_eq!(session.expires_at, clock.now() + Duration::days(7));

        let identity = sessions.authenticate(Some(&session.token)).unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.wallet_address, WALLET);
    }

    #[test]
    fn test_missing_token() {
        let sessions = issuer(Arc::new(ManualClock::starting_at_epoch_secs(0)));
        assert!(matches!(sessions.authenticate(None), Err(AuthError::TokenMissing)));
        assert!(matches!(sessions.authenticate(Some("  ")), Err(AuthError::TokenMissing)));
    }

    #[test]
    fn test_garbage_tokens_are_invalid() {
        let sessions = issuer(Arc::new(ManualClock::starting_at_epoch_secs(0)));
        for token in ["abc", "v1.abc", "v1..", "v2.e30.AAAA", "v1.!!!.???", "...."] {
            assert!(
                matches!(sessions.authenticate(Some(token)), Err(AuthError::TokenInvalid)),
                "{token}"
            );
        }
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let clock = Arc::new(ManualClock::starting_at_epoch_secs(1_770_000_000));
        let sessions = issuer(clock);
        let token = sessions.issue(&UserId::new(), WALLET).unwrap().token;

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = SessionClaims {
            sub: Uuid::new_v4(),
            wallet: WALLET.into(),
            iat: 0,
            exp: i64::MAX,
        };
        parts[1] = to_base64url(&serde_json::to_vec(&forged).unwrap());

        assert!(matches!(
            sessions.authenticate(Some(&parts.join("."))),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let clock = Arc::new(ManualClock::starting_at_epoch_secs(1_770_000_000));
        let token = issuer(clock.clone()).issue(&UserId::new(), WALLET).unwrap().token;
        assert!(issuer(clock).authenticate(Some(&token)).is_err());
    }

    #[test]
    fn test_expired_token() {
        let clock = Arc::new(ManualClock::starting_at_epoch_secs(1_770_000_000));
        let sessions = issuer(clock.clone());
        let token = sessions.issue(&UserId::new(), WALLET).unwrap().token;

        clock.advance(Duration::days(7) - Duration::seconds(1));
        assert!(sessions.authenticate(Some(&token)).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(matches!(
            sessions.authenticate(Some(&token)),
            Err(AuthError::TokenInvalid)
        ));
    }
}
