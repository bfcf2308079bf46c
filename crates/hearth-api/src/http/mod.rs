//! HTTP modules: routing, middleware, handlers, and error envelopes.

pub(crate) mod auth;
pub(crate) mod constants;
pub(crate) mod errors;
pub(crate) mod health;
pub(crate) mod router;
pub(crate) mod sse;
pub(crate) mod switches;
