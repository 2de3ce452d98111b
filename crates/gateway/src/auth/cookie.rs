//! `Cookie` request-header parsing and the `Set-Cookie` value that clears a credential.

use axum::http::{header, HeaderMap, HeaderValue};

/// Expiry stamp used to make the browser discard a cookie immediately.
const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Return the value of cookie `name` from the request headers.
///
/// Looks through every `Cookie` header, so split cookie headers (as sent by
/// HTTP/2 clients) are handled. An empty value counts as absent.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
}

/// Build the `Set-Cookie` value that expires cookie `name` on the client.
///
/// Returns `None` if `name` contains bytes that are illegal in a header value.
pub fn clear_cookie_header(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}=; Path=/; Expires={EPOCH}")).ok()
}
