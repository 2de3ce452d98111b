//! Tower layers wrapped around the gateway router.

use std::any::Any;

use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::error;

use common::protocol::ErrorResponse;
use common::GatewayError;

/// Permissive CORS: any origin, the four CRUD methods, JSON and auth headers.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Last-resort response for a panic anywhere in the handler chain.
///
/// The panic payload is logged; the client gets a generic 500.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    let err = GatewayError::Internal(detail.to_owned());
    error!(error = %err, "request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::from(&err)),
    )
        .into_response()
}
