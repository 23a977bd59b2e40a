//! HTTP API: JSON endpoints for registration, booking, the worklist
//! and finance, served to the lab's front-desk clients over the LAN.
//!
//! The router is composable; `api_router()` returns a `Router` that
//! can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use types::ApiContext;
