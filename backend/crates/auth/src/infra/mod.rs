//! Infrastructure Layer
//!
//! Database implementations and an in-memory double for tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAuthRepository;
pub use postgres::PgAuthRepository;
