//! Application Configuration
//!
//! Configuration for the Collect application layer.

use std::time::Duration;

/// Collect application configuration
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// Collects per user and UTC day
    pub user_daily_cap: u32,
    /// Collects per client IP and UTC day
    pub ip_daily_cap: u32,
    /// Collects per user inside one burst window
    pub burst_cap: u32,
    pub burst_window: Duration,
    /// Broadcast attempts before a request is marked failed
    pub broadcast_attempts: u32,
    /// Delay before the second attempt; doubles each retry
    pub broadcast_backoff: Duration,
    /// Background reconciliation period
    pub sweep_interval: Duration,
    /// Pending rows younger than this are left to client polling
    pub pending_grace: Duration,
    /// Rows examined per sweep
    pub sweep_batch: u32,
    /// Status polls per client IP and minute
    pub status_polls_per_ip_per_minute: u32,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            user_daily_cap: 10,
            ip_daily_cap: 30,
            burst_cap: 2,
            burst_window: Duration::from_secs(60),
            broadcast_attempts: 3,
            broadcast_backoff: Duration::from_millis(500),
            sweep_interval: Duration::from_secs(15),
            pending_grace: Duration::from_secs(20),
            sweep_batch: 50,
            status_polls_per_ip_per_minute: 120,
        }
    }
}

impl CollectConfig {
    /// Create config for development (relaxed caps)
    pub fn development() -> Self {
        Self {
            user_daily_cap: 100,
            ip_daily_cap: 300,
            burst_cap: 10,
            ..Default::default()
        }
    }

    pub fn pending_grace_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.pending_grace).unwrap_or(chrono::Duration::seconds(20))
    }

    /// Backoff before attempt `attempt` (1-based); zero for the first
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.broadcast_backoff
            .saturating_mul(1u32 << (attempt - 2).min(16))
    }
}
