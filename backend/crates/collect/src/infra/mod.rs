//! Infrastructure Layer
//!
//! Database repositories and the Solana chain gateway.

pub mod bubblegum;
pub mod chain;
pub mod memory;
pub mod postgres;

pub use chain::{MintConfig, SolanaChainGateway};
pub use memory::MemoryCollectRepository;
pub use postgres::PgCollectRepository;
