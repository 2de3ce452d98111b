//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderName;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::proxy::Dispatcher;
use crate::routes::RouteTable;

/// Read-only state shared across all requests.
///
/// Built once at startup. All fields are cheaply cloneable (`Arc`-wrapped or
/// already `Arc`-backed) so Axum can clone the state per request; nothing in
/// it is mutated while serving.
#[derive(Clone)]
pub struct GatewayState {
    /// Ordered route table.
    pub routes: Arc<RouteTable>,
    /// Verifier holding the shared signing secret.
    pub verifier: Arc<TokenVerifier>,
    /// Backend client and response timeout.
    pub dispatcher: Dispatcher,
    /// Name of the cookie carrying the credential.
    pub cookie_name: Arc<str>,
    /// Header the gateway writes the verified user id into.
    pub identity_header: HeaderName,
    /// Whether to attach the permissive CORS layer.
    pub cors_allow_any_origin: bool,
}

impl GatewayState {
    /// Build the state from a validated [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error if a backend URL or the identity header name is invalid.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let routes = RouteTable::from_config(&cfg.routes).context("invalid route table")?;
        let identity_header = HeaderName::from_bytes(cfg.identity_header_name.as_bytes())
            .with_context(|| format!("invalid identity header name {:?}", cfg.identity_header_name))?;

        Ok(Self {
            routes: Arc::new(routes),
            verifier: Arc::new(TokenVerifier::new(&cfg.jwt_secret)),
            dispatcher: Dispatcher::new(cfg.connect_timeout(), cfg.response_timeout()),
            cookie_name: Arc::from(cfg.auth_cookie_name.as_str()),
            identity_header,
            cors_allow_any_origin: cfg.cors_allow_any_origin,
        })
    }
}
