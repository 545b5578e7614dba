//! Collect Rate Limiter
//!
//! Three fixed-window counters that must all admit a request, checked in
//! order: the per-user burst window, the per-IP daily cap, then the per-user
//! daily cap. A rejection leaves the later counters untouched; earlier ones
//! stay spent. So neither a burst nor a crowded address costs the user any
//! daily quota.
//!
//! Status polls have their own per-IP minute window, since each poll may
//! reach the chain RPC.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::client::ClientIp;
use platform::rate_limit::{RateLimitRule, RateLimitStore};

use crate::application::config::CollectConfig;
use crate::error::{CollectError, CollectResult};

pub const USER_BURST_SCOPE: &str = "collect:user:burst";
pub const USER_DAILY_SCOPE: &str = "collect:user:day";
pub const IP_DAILY_SCOPE: &str = "collect:ip:day";
pub const STATUS_POLL_SCOPE: &str = "collect:status:ip:minute";

pub struct CollectRateLimiter<L>
where
    L: RateLimitStore,
{
    store: Arc<L>,
    user_burst: RateLimitRule,
    user_daily: RateLimitRule,
    ip_daily: RateLimitRule,
    status_polls: RateLimitRule,
}

impl<L> CollectRateLimiter<L>
where
    L: RateLimitStore,
{
    pub fn new(store: Arc<L>, config: &CollectConfig) -> Self {
        Self {
            store,
            user_burst: RateLimitRule::new(USER_BURST_SCOPE, config.burst_cap, config.burst_window),
            user_daily: RateLimitRule::daily(USER_DAILY_SCOPE, config.user_daily_cap),
            ip_daily: RateLimitRule::daily(IP_DAILY_SCOPE, config.ip_daily_cap),
            status_polls: RateLimitRule::new(
                STATUS_POLL_SCOPE,
                config.status_polls_per_ip_per_minute,
                Duration::from_secs(60),
            ),
        }
    }

    /// Count one collect attempt, or fail with `RateLimited`
    pub async fn check(
        &self,
        user_id: &UserId,
        client: &ClientIp,
        now: DateTime<Utc>,
    ) -> CollectResult<()> {
        let user = user_id.to_string();
        let ip = client.identity();

        for (rule, identity) in [
            (&self.user_burst, user.as_str()),
            (&self.ip_daily, ip.as_str()),
            (&self.user_daily, user.as_str()),
        ] {
            self.acquire(rule, identity, now).await?;
        }
        Ok(())
    }

    /// Count one status poll from `client`
    pub async fn check_status_poll(
        &self,
        client: &ClientIp,
        now: DateTime<Utc>,
    ) -> CollectResult<()> {
        self.acquire(&self.status_polls, &client.identity(), now).await
    }

    async fn acquire(
        &self,
        rule: &RateLimitRule,
        identity: &str,
        now: DateTime<Utc>,
    ) -> CollectResult<()> {
        let decision = self.store.try_acquire(rule, identity, now).await?;
        if !decision.allowed {
            tracing::warn!(
                scope = %rule.scope,
                identity = %identity,
                limit = decision.limit,
                reset_at = %decision.reset_at,
                "Collect rejected by rate limit"
            );
            return Err(CollectError::RateLimited {
                scope: rule.scope.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::rate_limit::MemoryRateLimitStore;

    fn start() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_773_489_600, 0).unwrap()
    }

    fn limiter(
        config: &CollectConfig,
    ) -> (
        Arc<MemoryRateLimitStore>,
        CollectRateLimiter<MemoryRateLimitStore>,
    ) {
        let store = Arc::new(MemoryRateLimitStore::new());
        (store.clone(), CollectRateLimiter::new(store, config))
    }

    fn scope_of(result: CollectResult<()>) -> String {
        match result {
            Err(CollectError::RateLimited { scope }) => scope,
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_burst_cap() {
        let (_, limiter) = limiter(&CollectConfig::default());
        let user = UserId::new();
        let client = ClientIp(None);

        limiter.check(&user, &client, start()).await.unwrap();
        limiter.check(&user, &client, start()).await.unwrap();
        assert_eq!(
            scope_of(limiter.check(&user, &client, start()).await),
            USER_BURST_SCOPE
        );

        let next_minute = start() + chrono::Duration::seconds(60);
        assert!(limiter.check(&user, &client, next_minute).await.is_ok());
    }

    #[tokio::test]
    async fn test_burst_rejection_spends_no_daily_quota() {
        let config = CollectConfig::default();
        let (store, limiter) = limiter(&config);
        let user = UserId::new();
        let client = ClientIp(None);

        for _ in 0..5 {
            let _ = limiter.check(&user, &client, start()).await;
        }

        let daily = RateLimitRule::daily(USER_DAILY_SCOPE, config.user_daily_cap);
        assert_eq!(store.count(&daily, &user.to_string(), start()), 2);
    }

    #[tokio::test]
    async fn test_ip_cap_spans_users() {
        let config = CollectConfig {
            ip_daily_cap: 3,
            ..Default::default()
        };
        let (_, limiter) = limiter(&config);
        let client = ClientIp(Some("198.51.100.4".parse().unwrap()));

        for _ in 0..3 {
            limiter.check(&UserId::new(), &client, start()).await.unwrap();
        }
        assert_eq!(
            scope_of(limiter.check(&UserId::new(), &client, start()).await),
            IP_DAILY_SCOPE
        );

        // Other addresses are unaffected
        let other = ClientIp(Some("198.51.100.5".parse().unwrap()));
        assert!(limiter.check(&UserId::new(), &other, start()).await.is_ok());
    }

    #[tokio::test]
    async fn test_ip_rejection_spends_no_user_daily_quota() {
        let config = CollectConfig {
            ip_daily_cap: 1,
            ..Default::default()
        };
        let (store, limiter) = limiter(&config);
        let client = ClientIp(Some("198.51.100.9".parse().unwrap()));
        limiter.check(&UserId::new(), &client, start()).await.unwrap();

        let user = UserId::new();
        assert_eq!(
            scope_of(limiter.check(&user, &client, start()).await),
            IP_DAILY_SCOPE
        );

        let daily = RateLimitRule::daily(USER_DAILY_SCOPE, config.user_daily_cap);
        assert_eq!(store.count(&daily, &user.to_string(), start()), 0);
    }

    #[tokio::test]
    async fn test_status_polls_throttled_per_ip_per_minute() {
        let config = CollectConfig {
            status_polls_per_ip_per_minute: 2,
            ..Default::default()
        };
        let (_, limiter) = limiter(&config);
        let client = ClientIp(Some("198.51.100.12".parse().unwrap()));

        limiter.check_status_poll(&client, start()).await.unwrap();
        limiter.check_status_poll(&client, start()).await.unwrap();
        assert_eq!(
            scope_of(limiter.check_status_poll(&client, start()).await),
            STATUS_POLL_SCOPE
        );

        // collect counters are separate
        assert!(limiter.check(&UserId::new(), &client, start()).await.is_ok());
        let next_minute = start() + chrono::Duration::seconds(60);
        assert!(limiter.check_status_poll(&client, next_minute).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_ip_shares_one_bucket() {
        let config = CollectConfig {
            ip_daily_cap: 1,
            ..Default::default()
        };
        let (_, limiter) = limiter(&config);

        limiter.check(&UserId::new(), &ClientIp(None), start()).await.unwrap();
        assert_eq!(
            scope_of(limiter.check(&UserId::new(), &ClientIp(None), start()).await),
            IP_DAILY_SCOPE
        );
    }
}
