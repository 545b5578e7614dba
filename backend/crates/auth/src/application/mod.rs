//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod generate_challenge;
pub mod session;
pub mod verify_signature;

// Re-exports
pub use config::AuthConfig;
pub use generate_challenge::{GenerateChallengeOutput, GenerateChallengeUseCase};
pub use session::{AuthenticatedUser, SessionIssuer, SessionToken};
pub use verify_signature::{VerifySignatureInput, VerifySignatureOutput, VerifySignatureUseCase};
