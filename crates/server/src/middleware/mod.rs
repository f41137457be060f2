//! HTTP middleware and extractors.
//!
//! # Layer order (outermost first, see [`crate::app`])
//!
//! 1. Sentry layers (hub per request, transaction per route), added in `main`
//! 2. `TraceLayer` (request span with status and latency)
//! 3. `CorsLayer`
//!
//! Authentication is per handler via [`RequireAccessToken`] and
//! [`RequireRefreshToken`].

pub mod auth;

pub use auth::{RequireAccessToken, RequireRefreshToken};
