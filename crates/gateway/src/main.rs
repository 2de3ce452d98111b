//! `api-gateway`: gateway binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from the YAML file and environment.
//! 2. Initialise telemetry (JSON logs, optional OTLP export).
//! 3. Build the route table and, if enabled, resolve every backend host.
//! 4. Build the shared [`GatewayState`] and the Axum router.
//! 5. Serve HTTP until SIGINT/SIGTERM, then drain in-flight requests.

mod auth;
mod config;
mod identity;
mod proxy;
mod routes;
mod server;
mod telemetry;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::info;

use config::Config;
use server::state::GatewayState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::load().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        routes = cfg.routes.len(),
        "api-gateway starting"
    );

    // -----------------------------------------------------------------------
    // 3. Route table
    // -----------------------------------------------------------------------
    let state = GatewayState::from_config(&cfg)?;
    for entry in state.routes.entries() {
        info!(
            prefix = entry.prefix(),
            backend = %entry.backend().authority(),
            policy = ?entry.policy(),
            "route registered"
        );
    }
    if cfg.resolve_backends {
        state
            .routes
            .check_backends_resolve()
            .await
            .context("backend resolution failed")?;
    }

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(state);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("api-gateway stopped");
    Ok(())
}

/// Resolve when the process receives Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
