//! Axum request handlers.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{ErrorResponse, HealthResponse};
use common::GatewayError;
use tracing::{error, warn};

use crate::auth::clear_cookie_header;

use super::pipeline;
use super::state::GatewayState;

/// Fallback handler: every request not served by the gateway itself is
/// resolved against the route table and proxied.
pub async fn proxy(State(state): State<GatewayState>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    match pipeline::run(&state, request).await {
        Ok(response) => response,
        Err(err) => {
            if err.http_status() >= 500 {
                error!(%method, %path, error = %err, "proxy request failed");
            } else {
                warn!(%method, %path, error = %err, "proxy request rejected");
            }
            error_response(&err, &state.cookie_name)
        }
    }
}

/// `GET /health`: liveness of the gateway itself. Backends are not probed.
pub async fn health(State(state): State<GatewayState>) -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        routes: state.routes.len(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Render a [`GatewayError`] as a generic JSON response.
///
/// Invalid credentials additionally expire the credential cookie so the
/// browser stops resending it.
pub fn error_response(err: &GatewayError, cookie_name: &str) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(ErrorResponse::from(err))).into_response();

    if err.clears_credential() {
        if let Some(value) = clear_cookie_header(cookie_name) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
