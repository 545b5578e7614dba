//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64)
//! - Client identification (client IP behind proxies)
//! - Rate limiting infrastructure (atomic fixed-window counters)
//! - Solana primitives (keys, PDAs, transaction encoding, JSON-RPC client)

pub mod client;
pub mod crypto;
pub mod rate_limit;
pub mod solana;
