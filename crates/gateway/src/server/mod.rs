//! Axum HTTP server: routing, per-request pipeline, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with the health route, the proxy fallback, and
//!   shared middleware (tracing, request ids, CORS, panic catching).
//! - Drive each proxied request through the [`pipeline`] state machine.
//! - Inject the read-only [`state::GatewayState`] into handlers.

pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod router;
pub mod state;
