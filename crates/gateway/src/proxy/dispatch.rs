//! Sending the forwarded request and relaying the backend response.

use std::error::Error as _;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use thiserror::Error;
use tracing::{debug, info};

use common::GatewayError;

use super::client::{self, HttpClient};
use super::headers;

/// Backend-leg failures.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connection refused, DNS failure, connect timeout, or the connection dropped.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// No response headers within the response timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The backend sent bytes that are not a valid HTTP response.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<ProxyError> for GatewayError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Unreachable(detail) => GatewayError::BackendUnreachable(detail),
            ProxyError::Timeout(after) => GatewayError::BackendTimeout(format!("{after:?}")),
            ProxyError::Malformed(detail) => GatewayError::BackendMalformed(detail),
        }
    }
}

/// Forwards requests over the shared client, bounded by a response timeout.
///
/// Cheap to clone; every clone shares one connection pool.
#[derive(Clone)]
pub struct Dispatcher {
    client: HttpClient,
    response_timeout: Duration,
}

impl Dispatcher {
    pub fn new(connect_timeout: Duration, response_timeout: Duration) -> Self {
        Self {
            client: client::build(connect_timeout),
            response_timeout,
        }
    }

    /// Send `request` (already rewritten to an absolute backend URI) and
    /// return the backend's response with a streaming body.
    ///
    /// Dropping the returned future, or the response body, aborts the backend
    /// exchange and releases the connection.
    ///
    /// # Errors
    ///
    /// See [`ProxyError`]. Failures are never retried.
    pub async fn dispatch(&self, request: Request) -> Result<Response, ProxyError> {
        let method = request.method().clone();
        let target = request.uri().clone();
        let started = Instant::now();

        let mut response = tokio::time::timeout(self.response_timeout, self.client.request(request))
            .await
            .map_err(|_| ProxyError::Timeout(self.response_timeout))?
            .map_err(classify)?;

        headers::strip_hop_by_hop(response.headers_mut());

        info!(
            %method,
            %target,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "backend responded"
        );
        Ok(response.map(Body::new))
    }
}

/// Map a client error onto the gateway's backend failure classes.
fn classify(err: hyper_util::client::legacy::Error) -> ProxyError {
    let detail = describe(&err);
    if err.is_connect() {
        return ProxyError::Unreachable(detail);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(h) = cause.downcast_ref::<hyper::Error>() {
            if h.is_parse() || h.is_parse_status() || h.is_incomplete_message() {
                return ProxyError::Malformed(detail);
            }
        }
        source = cause.source();
    }
    debug!(error = %detail, "unclassified client error treated as unreachable");
    ProxyError::Unreachable(detail)
}

/// Flatten an error and its sources into one line for logs.
fn describe(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
