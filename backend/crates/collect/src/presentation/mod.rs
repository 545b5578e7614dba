//! Presentation Layer
//!
//! HTTP handlers, DTOs and the router.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::CollectAppState;
pub use router::{collect_router, collect_router_generic};
