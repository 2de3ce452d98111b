//! Error taxonomy and wire types shared across the `api-gateway` crates.

pub mod error;
pub mod protocol;

pub use error::GatewayError;
