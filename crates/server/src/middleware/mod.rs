//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is per-handler through the extractors in [`auth`].

pub mod auth;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth};
pub use request_id::request_id_middleware;
