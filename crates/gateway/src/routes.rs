//! Route table: ordered prefix → backend mapping with an authorization policy.
//!
//! The table is built once from [`RouteConfig`]s at startup and only read
//! afterwards. Resolution walks entries in configuration order and returns the
//! first whose prefix matches, so specific prefixes must be listed before
//! general ones.

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::Uri;
use thiserror::Error;
use tracing::{debug, info};

use common::GatewayError;

use crate::config::{Policy, RouteConfig};

/// Errors from building or consulting the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No configured prefix matches the request path.
    #[error("no route for {0}")]
    NoMatch(String),

    /// A configured backend URL is unusable.
    #[error("invalid backend {backend:?}: {reason}")]
    InvalidBackend { backend: String, reason: String },

    /// A backend host name did not resolve at startup.
    #[error("backend host {host} did not resolve: {reason}")]
    Unresolvable { host: String, reason: String },

    /// The rewritten request target could not be assembled into a URI.
    #[error("cannot build backend URI: {0}")]
    InvalidTarget(String),
}

impl From<RouteError> for GatewayError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::NoMatch(path) => GatewayError::NoMatch(path),
            other => GatewayError::Internal(other.to_string()),
        }
    }
}

/// Parsed backend base URL.
#[derive(Debug, Clone)]
pub struct Backend {
    scheme: Scheme,
    authority: Authority,
    /// Path part of the base URL without a trailing slash; empty for `http://host`.
    base_path: String,
}

impl Backend {
    /// Parse a backend base URL such as `http://cursos:3002` or `http://svc/v1`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidBackend`] for anything that is not an
    /// absolute `http` URL without a query.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidBackend {
            backend: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let uri: Uri = raw.trim().parse().map_err(|_| invalid("not a URI"))?;
        match uri.scheme() {
            Some(s) if *s == Scheme::HTTP => {}
            Some(_) => return Err(invalid("only http backends are supported")),
            None => return Err(invalid("missing scheme")),
        }
        let authority = uri.authority().cloned().ok_or_else(|| invalid("missing host"))?;
        if uri.query().is_some() {
            return Err(invalid("backend URL must not carry a query"));
        }

        Ok(Self {
            scheme: Scheme::HTTP,
            authority,
            base_path: uri.path().trim_end_matches('/').to_owned(),
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    fn host_port(&self) -> (&str, u16) {
        (self.authority.host(), self.authority.port_u16().unwrap_or(80))
    }
}

/// A single immutable routing rule.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Prefix without trailing slash; empty for the catch-all `/`.
    prefix: String,
    backend: Backend,
    policy: Policy,
    strip_prefix: bool,
}

impl RouteEntry {
    /// Build an entry from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidBackend`] if the backend URL is unusable.
    pub fn from_config(cfg: &RouteConfig) -> Result<Self, RouteError> {
        Ok(Self {
            prefix: cfg.prefix.trim_end_matches('/').to_owned(),
            backend: Backend::parse(&cfg.backend)?,
            policy: cfg.policy,
            strip_prefix: cfg.strip_prefix,
        })
    }

    /// Prefix as configured (normalised, `/` for the catch-all).
    pub fn prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Segment-aware prefix match: `/api/curso` matches `/api/curso` and
    /// `/api/curso/101` but not `/api/cursos`.
    pub fn matches<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }

    /// Rewrite an inbound request URI into the absolute backend URI.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NoMatch`] if `uri` is not under this entry's
    /// prefix, or [`RouteError::InvalidTarget`] if the result is not a valid URI.
    pub fn target_uri(&self, uri: &Uri) -> Result<Uri, RouteError> {
        let path = uri.path();
        let rest = self
            .matches(path)
            .ok_or_else(|| RouteError::NoMatch(path.to_owned()))?;
        let suffix = if self.strip_prefix { rest } else { path };

        let mut target = format!("{}{}", self.backend.base_path, suffix);
        if target.is_empty() {
            target.push('/');
        }
        if let Some(query) = uri.query() {
            target.push('?');
            target.push_str(query);
        }

        let path_and_query: PathAndQuery = target
            .parse()
            .map_err(|e| RouteError::InvalidTarget(format!("{e}")))?;
        Uri::builder()
            .scheme(self.backend.scheme.clone())
            .authority(self.backend.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| RouteError::InvalidTarget(e.to_string()))
    }
}

/// Ordered, immutable set of [`RouteEntry`]s.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Build the table from configuration, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first [`RouteError::InvalidBackend`] encountered.
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, RouteError> {
        let entries = routes
            .iter()
            .map(RouteEntry::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Return the first entry whose prefix matches `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NoMatch`] when nothing matches.
    pub fn resolve(&self, path: &str) -> Result<&RouteEntry, RouteError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.matches(path).is_some())
            .ok_or_else(|| RouteError::NoMatch(path.to_owned()))?;
        debug!(path, prefix = entry.prefix(), "route resolved");
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Resolve every backend host name once, failing on the first that does not resolve.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Unresolvable`] naming the offending host.
    pub async fn check_backends_resolve(&self) -> Result<(), RouteError> {
        for entry in &self.entries {
            let (host, port) = entry.backend.host_port();
            let mut addrs = tokio::net::lookup_host((host, port))
                .await
                .map_err(|e| RouteError::Unresolvable {
                    host: host.to_owned(),
                    reason: e.to_string(),
                })?;
            if addrs.next().is_none() {
                return Err(RouteError::Unresolvable {
                    host: host.to_owned(),
                    reason: "no addresses returned".into(),
                });
            }
            info!(prefix = entry.prefix(), host, port, "backend resolved");
        }
        Ok(())
    }
}
