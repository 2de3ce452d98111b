//! Per-request state machine: resolve → authenticate → dispatch.
//!
//! ```text
//! Received ──► Resolved ──(protected)──► Authenticating ──► Authorized ──► Dispatching ──► Completed
//!    │            │ (public) ───────────────────────────────►   ▲                │
//!    │            │                           │ (rejected)                       │
//!    └─ NoMatch ──┴──────────────► Errored ◄──┴──────────────────────────────────┘
//! ```
//!
//! Every request ends in exactly one terminal stage. Errors are values here;
//! the handler turns [`GatewayError`] into a response.

use axum::extract::Request;
use axum::response::Response;
use tracing::debug;

use common::GatewayError;

use crate::auth::{read_cookie, ClaimSet};
use crate::config::Policy;
use crate::identity;
use crate::proxy::build_forwarded;
use crate::routes::RouteEntry;

use super::state::GatewayState;

/// One step of request handling. `Completed` and `Errored` are terminal.
pub enum Stage<'a> {
    Received(Request),
    Resolved {
        request: Request,
        route: &'a RouteEntry,
    },
    Authenticating {
        request: Request,
        route: &'a RouteEntry,
    },
    Authorized {
        request: Request,
        route: &'a RouteEntry,
        claims: Option<ClaimSet>,
    },
    Dispatching {
        forwarded: Request,
        route: &'a RouteEntry,
    },
    Completed(Response),
    Errored(GatewayError),
}

impl<'a> Stage<'a> {
    /// Short name used in logs and tests.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Received(_) => "received",
            Stage::Resolved { .. } => "resolved",
            Stage::Authenticating { .. } => "authenticating",
            Stage::Authorized { .. } => "authorized",
            Stage::Dispatching { .. } => "dispatching",
            Stage::Completed(_) => "completed",
            Stage::Errored(_) => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed(_) | Stage::Errored(_))
    }

    /// Perform a single transition. Terminal stages are returned unchanged.
    pub async fn advance(self, state: &'a GatewayState) -> Stage<'a> {
        match self {
            Stage::Received(request) => match state.routes.resolve(request.uri().path()) {
                Ok(route) => Stage::Resolved { request, route },
                Err(e) => Stage::Errored(e.into()),
            },

            Stage::Resolved { request, route } => match route.policy() {
                Policy::Protected => Stage::Authenticating { request, route },
                Policy::Public => Stage::Authorized {
                    request,
                    route,
                    claims: None,
                },
            },

            Stage::Authenticating { request, route } => {
                let cookie = read_cookie(request.headers(), &state.cookie_name);
                match state.verifier.verify(cookie) {
                    Ok(claims) => {
                        debug!(prefix = route.prefix(), exp = claims.exp, "credential verified");
                        Stage::Authorized {
                            request,
                            route,
                            claims: Some(claims),
                        }
                    }
                    Err(e) => Stage::Errored(e.into()),
                }
            }

            Stage::Authorized {
                request,
                route,
                claims,
            } => {
                let identity = identity::propagate(&state.identity_header, claims.as_ref());
                match build_forwarded(request, route, &state.identity_header, identity) {
                    Ok(forwarded) => Stage::Dispatching { forwarded, route },
                    Err(e) => Stage::Errored(e.into()),
                }
            }

            Stage::Dispatching { forwarded, route } => {
                debug!(prefix = route.prefix(), uri = %forwarded.uri(), "dispatching");
                match state.dispatcher.dispatch(forwarded).await {
                    Ok(response) => Stage::Completed(response),
                    Err(e) => Stage::Errored(e.into()),
                }
            }

            terminal @ (Stage::Completed(_) | Stage::Errored(_)) => terminal,
        }
    }
}

/// Drive a request from `Received` to a terminal stage.
pub async fn run(state: &GatewayState, request: Request) -> Result<Response, GatewayError> {
    let mut stage = Stage::Received(request);
    while !stage.is_terminal() {
        stage = stage.advance(state).await;
    }
    match stage {
        Stage::Completed(response) => Ok(response),
        Stage::Errored(err) => Err(err),
        other => Err(GatewayError::Internal(format!(
            "pipeline stopped in non-terminal stage {}",
            other.name()
        ))),
    }
}
