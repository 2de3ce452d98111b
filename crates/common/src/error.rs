//! Gateway error taxonomy shared across crates.

use thiserror::Error;

/// Every way a proxied request can end without a relayed backend response.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`GatewayError::MissingCredential`] → 401
/// - [`GatewayError::InvalidCredential`] → 401 (and the credential cookie is cleared)
/// - [`GatewayError::NoMatch`] → 404
/// - [`GatewayError::BackendUnreachable`] → 502
/// - [`GatewayError::BackendTimeout`] → 504
/// - [`GatewayError::BackendMalformed`] → 502
/// - [`GatewayError::Internal`] → 500
///
/// The `String` payloads are operator-facing detail. They are logged and
/// never written into a response body; see [`GatewayError::public_message`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A protected route was requested without the credential cookie.
    #[error("missing credential")]
    MissingCredential,

    /// The credential failed signature, format, or expiry checks.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// No configured route prefix matches the request path.
    #[error("no route matches path {0}")]
    NoMatch(String),

    /// The backend refused the connection or could not be reached.
    #[error("backend unreachable: {0}")]
    BackendUnreachable(String),

    /// The backend did not answer within the configured response timeout.
    #[error("backend timed out: {0}")]
    BackendTimeout(String),

    /// The backend answered with something that is not valid HTTP.
    #[error("malformed backend response: {0}")]
    BackendMalformed(String),

    /// Any other fault inside the gateway.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::MissingCredential | GatewayError::InvalidCredential(_) => 401,
            GatewayError::NoMatch(_) => 404,
            GatewayError::BackendUnreachable(_) | GatewayError::BackendMalformed(_) => 502,
            GatewayError::BackendTimeout(_) => 504,
            GatewayError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MissingCredential => "missing_credential",
            GatewayError::InvalidCredential(_) => "invalid_credential",
            GatewayError::NoMatch(_) => "not_found",
            GatewayError::BackendUnreachable(_) => "bad_gateway",
            GatewayError::BackendTimeout(_) => "gateway_timeout",
            GatewayError::BackendMalformed(_) => "bad_gateway",
            GatewayError::Internal(_) => "internal_error",
        }
    }

    /// Client-safe message. Contains no detail from the error payload.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::MissingCredential => "access denied: no credential provided",
            GatewayError::InvalidCredential(_) => "access denied: invalid or expired credential",
            GatewayError::NoMatch(_) => "the requested resource does not exist",
            GatewayError::BackendUnreachable(_) | GatewayError::BackendMalformed(_) => {
                "the upstream service is unavailable"
            }
            GatewayError::BackendTimeout(_) => "the upstream service did not respond in time",
            GatewayError::Internal(_) => "internal server error",
        }
    }

    /// Whether the response must instruct the client to drop its credential cookie.
    pub fn clears_credential(&self) -> bool {
        matches!(self, GatewayError::InvalidCredential(_))
    }
}
