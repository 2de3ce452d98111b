//! Axum router construction.

use axum::{routing::get, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::{handlers, middleware, state::GatewayState};

/// Build the gateway [`Router`]: its own health check, the proxy fallback,
/// and the shared middleware stack.
pub fn build(state: GatewayState) -> Router {
    let cors = state.cors_allow_any_origin;

    let router = Router::new()
        .route("/health", get(handlers::health))
        .fallback(handlers::proxy)
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let router = if cors {
        router.layer(middleware::cors())
    } else {
        router
    };
    router.with_state(state)
}
