//! HTTP surface for the Hearth gateway.
//!
//! # Design
//! - Authentication is permissive at the middleware: every request gets an
//!   [`AuthContext`] extension and continues to its handler.
//! - Handlers are strict: they reject unauthenticated callers and defer
//!   per-entity authorization to the entity layer.

pub mod models;

mod http;
mod state;

pub use http::auth::AuthContext;
pub use http::router::{ApiServer, ApiServerError};
pub use state::ApiState;
