//! Value Object Module

pub mod challenge_message;
pub mod public_id;
pub mod wallet_address;
