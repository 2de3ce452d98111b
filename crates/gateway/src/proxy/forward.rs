//! Construction of the outbound request sent to a backend.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderName, HeaderValue, Version};

use crate::identity::{self, IdentityHeader};
use crate::routes::{RouteEntry, RouteError};

use super::headers;

/// Turn the inbound request into the request forwarded to `route`'s backend.
///
/// Method and body are kept (the body stays a stream). The URI is rewritten
/// per the route's prefix policy, the version is pinned to HTTP/1.1, hop-by-hop headers and any client-sent
/// identity header are dropped, `Host` is set to the backend authority, and
/// `identity` (when present) is inserted as the only identity header.
///
/// # Errors
///
/// Returns a [`RouteError`] if the backend URI cannot be assembled.
pub fn build_forwarded(
    request: Request,
    route: &RouteEntry,
    identity_name: &HeaderName,
    identity: Option<IdentityHeader>,
) -> Result<Request, RouteError> {
    let (mut parts, body) = request.into_parts();

    parts.uri = route.target_uri(&parts.uri)?;
    // The backend leg is always HTTP/1.1, whatever the client spoke.
    parts.version = Version::HTTP_11;

    let client_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let original_host = parts.headers.remove(header::HOST);

    headers::strip_hop_by_hop(&mut parts.headers);
    identity::strip_inbound(&mut parts.headers, identity_name);
    headers::append_forwarded(&mut parts.headers, client_ip, original_host);

    let host = HeaderValue::from_str(route.backend().authority().as_str())
        .map_err(|e| RouteError::InvalidTarget(e.to_string()))?;
    parts.headers.insert(header::HOST, host);

    if let Some((name, value)) = identity {
        parts.headers.insert(name, value);
    }

    Ok(Request::from_parts(parts, body))
}
