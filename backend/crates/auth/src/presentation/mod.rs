//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and the bearer-token guard.

pub mod dto;
pub mod guard;
pub mod handlers;
pub mod router;

pub use guard::{Authenticated, bearer_token};
pub use handlers::AuthAppState;
pub use router::{auth_router, auth_router_generic};
