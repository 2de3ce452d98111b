//! Credential handling: reading the session cookie and verifying the token in it.
//!
//! # Trust invariants
//!
//! - A credential is either fully valid (well-formed, HS256 signature matches
//!   the shared secret, unexpired) or rejected. There is no partial trust.
//! - Verification failure reasons go to the logs only. Clients see a generic
//!   401 body.
//! - Decoded claims live for one request and are never stored.

pub mod cookie;
pub mod token;

pub use cookie::{clear_cookie_header, read_cookie};
pub use token::{ClaimSet, TokenVerifier};
