//! Application Layer
//!
//! Use cases, the collect rate limiter and the confirmation tracker.

pub mod check_status;
pub mod config;
pub mod confirmation;
pub mod prepare_collect;
pub mod rate_limiter;

// Re-exports
pub use check_status::{CheckStatusUseCase, CollectionStatusOutput};
pub use config::CollectConfig;
pub use confirmation::{ConfirmationTracker, SweepReport};
pub use prepare_collect::{PrepareCollectInput, PrepareCollectUseCase};
pub use rate_limiter::CollectRateLimiter;
