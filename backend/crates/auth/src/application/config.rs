//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::rate_limit::RateLimitRule;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Domain shown in the challenge message header
    pub domain: String,
    /// How long an issued challenge may be verified (5 minutes)
    pub challenge_ttl: Duration,
    /// Session token lifetime (1 week)
    pub session_ttl: Duration,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Challenge issuance throttle per client IP and minute
    pub challenge_per_ip_per_minute: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            challenge_ttl: Duration::from_secs(5 * 60),
            session_ttl: Duration::from_secs(7 * 24 * 3600),
            session_secret: [0u8; 32],
            challenge_per_ip_per_minute: 30,
        }
    }
}

impl AuthConfig {
    /// Create config with a random session secret
    pub fn with_random_secret() -> Self {
        Self {
            session_secret: platform::crypto::random_array(),
            ..Default::default()
        }
    }

    /// Create config for development (random secret, sessions die on restart)
    pub fn development() -> Self {
        Self::with_random_secret()
    }

    pub fn challenge_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.challenge_ttl).unwrap_or(chrono::Duration::minutes(5))
    }

    pub fn session_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.session_ttl).unwrap_or(chrono::Duration::days(7))
    }

    /// Counter backing the challenge issuance throttle
    pub fn challenge_rate_rule(&self) -> RateLimitRule {
        RateLimitRule::new(
            "auth:challenge:ip",
            self.challenge_per_ip_per_minute,
            Duration::from_secs(60),
        )
    }
}
