//! Structured logging and optional OpenTelemetry span export.
//!
//! Logs are JSON lines on stdout. When `OTEL_EXPORTER_OTLP_ENDPOINT` is set,
//! spans (including the per-request `TraceLayer` spans) are also exported
//! over OTLP/gRPC.
//!
//! # Telemetry invariants
//!
//! - **No credential material** (cookie values, tokens, the signing secret)
//!   appears in any span attribute or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden
//!   by `RUST_LOG` when present.

pub mod init;

pub use init::init_telemetry;
