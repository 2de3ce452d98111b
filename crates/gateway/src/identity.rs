//! Identity header derived from verified claims.
//!
//! The gateway is the only writer of the identity header: any copy sent by the
//! client is removed before forwarding, and a new one is added only when a
//! credential was verified during this request.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::auth::ClaimSet;

/// Header carrying the verified user id, e.g. `("x-user-id", "42")`.
pub type IdentityHeader = (HeaderName, HeaderValue);

/// Derive the identity header from `claims`.
///
/// Returns `None` for public routes (no claims), for tokens without a user id,
/// and for user ids that are empty or not representable as a header value.
pub fn propagate(name: &HeaderName, claims: Option<&ClaimSet>) -> Option<IdentityHeader> {
    let user_id = claims?.user_id.as_ref()?.to_string();
    if user_id.is_empty() {
        return None;
    }
    match HeaderValue::from_str(&user_id) {
        Ok(value) => Some((name.clone(), value)),
        Err(_) => {
            warn!("user id is not a valid header value; identity header omitted");
            None
        }
    }
}

/// Remove every client-supplied copy of the identity header.
pub fn strip_inbound(headers: &mut HeaderMap, name: &HeaderName) {
    if headers.remove(name).is_some() {
        warn!(header = %name, "dropped client-supplied identity header");
    }
}
