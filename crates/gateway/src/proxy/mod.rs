//! Forwarding of requests to backends and relaying of their responses.
//!
//! # Responsibilities
//! - Rewrite the inbound request into the outbound one: backend URI, hop-by-hop
//!   header removal, identity header replacement, `X-Forwarded-*` headers.
//! - Send it over a pooled, non-blocking HTTP/1.1 client.
//! - Stream the backend response back without buffering, or map the failure
//!   to a gateway error (502 / 504). Nothing is retried.

pub mod client;
pub mod dispatch;
pub mod forward;
pub mod headers;

pub use dispatch::Dispatcher;
pub use forward::build_forwarded;
