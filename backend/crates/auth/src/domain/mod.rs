//! Domain Layer
//!
//! Contains entities, value objects, signature verification and repository
//! traits.

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;

// Re-exports
pub use entity::{challenge::Challenge, user::User};
pub use repository::{ChallengeRepository, UserRepository};
