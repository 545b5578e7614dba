//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (CollectiblePost, CollectionRequest, CollectOutcome)
//! - The chain gateway port
//! - Repository traits (interfaces)

pub mod chain;
pub mod entities;
pub mod repository;

pub use chain::{AssetLookup, ChainGateway, PreparedMint, SignatureState};
pub use entities::{
    CollectOutcome, CollectiblePost, CollectionRequest, CollectionStatus, Transition,
};
pub use repository::{CollectionRepository, PostRepository};
