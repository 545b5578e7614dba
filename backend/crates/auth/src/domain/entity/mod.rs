//! Entity Module

pub mod challenge;
pub mod user;
