//! Configuration loading and validation for the gateway.
//!
//! Values come from an optional YAML file (path in `GATEWAY_CONFIG`, default
//! `gateway.yaml`) overlaid by environment variables. The route list normally
//! lives in the file; scalars such as `JWT_SECRET` are usually set in the
//! environment. The process exits with a clear error if anything required is
//! missing or invalid.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming the YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";

/// Authorization policy attached to a route prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Forwarded without any credential check.
    Public,
    /// Requires a valid credential cookie before dispatch.
    Protected,
}

/// One configured route: a path prefix and the backend that serves it.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Path prefix, e.g. `"/api/curso"`. Must start with `/`.
    pub prefix: String,

    /// Backend base URL, e.g. `"http://cursos:3002"`.
    pub backend: String,

    /// Whether the route requires a credential.
    pub policy: Policy,

    /// Remove `prefix` from the path before forwarding.
    #[serde(default = "default_strip_prefix")]
    pub strip_prefix: bool,
}

/// Validated gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the gateway HTTP listener binds on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// HS256 secret shared with the token-issuing auth service. **Required.**
    pub jwt_secret: String,

    /// Name of the cookie that carries the credential.
    #[serde(default = "default_auth_cookie_name")]
    pub auth_cookie_name: String,

    /// Header injected with the verified user id.
    #[serde(default = "default_identity_header_name")]
    pub identity_header_name: String,

    /// TCP connect timeout towards backends, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Time allowed for a backend to return response headers, in milliseconds.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    /// Resolve every backend host name at startup and refuse to start if one fails.
    #[serde(default = "default_resolve_backends")]
    pub resolve_backends: bool,

    /// Attach a permissive CORS layer (any origin, GET/POST/PUT/DELETE).
    #[serde(default = "default_cors_allow_any_origin")]
    pub cors_allow_any_origin: bool,

    /// Optional OTLP endpoint. Spans are exported only when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Ordered route list. The first matching prefix wins. **Required.**
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

fn default_strip_prefix() -> bool {
    true
}
fn default_listen_port() -> u16 {
    3000
}
fn default_auth_cookie_name() -> String {
    "authToken".into()
}
fn default_identity_header_name() -> String {
    "X-User-ID".into()
}
fn default_connect_timeout_ms() -> u64 {
    2_000
}
fn default_response_timeout_ms() -> u64 {
    30_000
}
fn default_resolve_backends() -> bool {
    true
}
fn default_cors_allow_any_origin() -> bool {
    true
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from the YAML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, a required value is absent,
    /// or validation fails.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "gateway.yaml".into());

        let cfg = config::Config::builder()
            .add_source(config::File::new(&path, config::FileFormat::Yaml).required(false))
            .add_source(config::Environment::default().separator("__"))
            .build()
            .with_context(|| format!("failed to build configuration (file: {path})"))?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    pub fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.jwt_secret, "JWT_SECRET")?;
        ensure_non_empty(&self.auth_cookie_name, "AUTH_COOKIE_NAME")?;
        ensure_non_empty(&self.identity_header_name, "IDENTITY_HEADER_NAME")?;

        if self.connect_timeout_ms == 0 {
            anyhow::bail!("CONNECT_TIMEOUT_MS must be > 0");
        }
        if self.response_timeout_ms == 0 {
            anyhow::bail!("RESPONSE_TIMEOUT_MS must be > 0");
        }
        if self.routes.is_empty() {
            anyhow::bail!("at least one route must be configured");
        }

        let mut seen = HashSet::new();
        for route in &self.routes {
            if !route.prefix.starts_with('/') {
                anyhow::bail!("route prefix {:?} must start with '/'", route.prefix);
            }
            if !seen.insert(route.prefix.trim_end_matches('/')) {
                anyhow::bail!("route prefix {:?} is configured more than once", route.prefix);
            }
            ensure_non_empty(&route.backend, "route backend")?;
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(prefix: &str, backend: &str, policy: Policy) -> RouteConfig {
        RouteConfig {
            prefix: prefix.into(),
            backend: backend.into(),
            policy,
            strip_prefix: true,
        }
    }

    fn valid_config() -> Config {
        Config {
            listen_port: default_listen_port(),
            jwt_secret: "secret".into(),
            auth_cookie_name: default_auth_cookie_name(),
            identity_header_name: default_identity_header_name(),
            connect_timeout_ms: default_connect_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            resolve_backends: default_resolve_backends(),
            cors_allow_any_origin: default_cors_allow_any_origin(),
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
            routes: vec![
                route("/api/inscripcion", "http://app:3001", Policy::Protected),
                route("/api/curso", "http://cursos:3002", Policy::Public),
            ],
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_port(), 3000);
        assert_eq!(default_auth_cookie_name(), "authToken");
        assert_eq!(default_identity_header_name(), "X-User-ID");
        assert_eq!(default_connect_timeout_ms(), 2_000);
        assert_eq!(default_response_timeout_ms(), 30_000);
        assert!(default_strip_prefix());
        assert!(default_resolve_backends());
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_secret() {
        let mut cfg = valid_config();
        cfg.jwt_secret = "  ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_routes() {
        let mut cfg = valid_config();
        cfg.routes.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_relative_prefix() {
        let mut cfg = valid_config();
        cfg.routes.push(route("api/other", "http://other:80", Policy::Public));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_prefix() {
        let mut cfg = valid_config();
        cfg.routes.push(route("/api/curso/", "http://other:80", Policy::Public));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = valid_config();
        cfg.response_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn routes_deserialise_from_yaml() {
        let yaml = r#"
jwt_secret: s3cret
routes:
  - prefix: /api/inscripcion
    backend: http://app:3001
    policy: protected
  - prefix: /api/curso
    backend: http://cursos:3002
    policy: public
    strip_prefix: false
"#;
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.routes.len(), 2);
        assert_eq!(cfg.routes[0].policy, Policy::Protected);
        assert!(cfg.routes[0].strip_prefix);
        assert_eq!(cfg.routes[1].policy, Policy::Public);
        assert!(!cfg.routes[1].strip_prefix);
        assert_eq!(cfg.listen_port, 3000);
        assert!(cfg.validate().is_ok());
    }
}
