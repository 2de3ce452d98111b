//! Helpers shared by unit tests: token minting and in-process mock backends.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use crate::config::{Config, Policy, RouteConfig};

pub const SECRET: &str = "test-signing-secret";

/// Size of the body served by the mock backend's `/blob` endpoint.
pub const BLOB_LEN: usize = 256 * 1024;

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}

/// Sign `claims` as an HS256 token.
pub fn mint_token(secret: &str, claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encodes")
}

/// Deterministic payload for byte-for-byte relay checks.
pub fn blob() -> Vec<u8> {
    (0..BLOB_LEN).map(|i| (i % 251) as u8).collect()
}

/// Mock backend: echoes the request as JSON, counting every hit.
///
/// - `GET /slow` sleeps for five seconds before answering.
/// - `GET /blob` returns [`blob`] with a custom header.
/// - anything else echoes method, URI, headers and body.
pub fn echo_backend(hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route("/slow", get(slow))
        .route("/blob", get(blob_handler))
        .fallback(echo)
        .with_state(hits)
}

async fn echo(
    State(hits): State<Arc<AtomicUsize>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_owned()))
        .collect();
    let body = json!({
        "method": method.as_str(),
        "uri": uri.to_string(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn slow(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}

async fn blob_handler(State(hits): State<Arc<AtomicUsize>>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::CREATED,
        [("x-backend", "cursos"), ("content-type", "application/octet-stream")],
        blob(),
    )
        .into_response()
}

/// Serve `router` on an ephemeral localhost port.
pub async fn spawn_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// A backend that answers every connection with bytes that are not HTTP.
pub async fn spawn_malformed_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind malformed backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let _ = stream.write_all(b"this is not http\r\n\r\n").await;
            let _ = stream.shutdown().await;
        }
    });
    addr
}

/// An address nothing listens on: bound once, then released.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

/// Gateway configuration with a protected enrollment route and a public
/// courses route pointing at the given backends.
pub fn gateway_config(enrollment: SocketAddr, courses: SocketAddr) -> Config {
    Config {
        listen_port: 0,
        jwt_secret: SECRET.into(),
        auth_cookie_name: "authToken".into(),
        identity_header_name: "X-User-ID".into(),
        connect_timeout_ms: 500,
        response_timeout_ms: 2_000,
        resolve_backends: false,
        cors_allow_any_origin: true,
        otel_exporter_otlp_endpoint: None,
        log_level: "debug".into(),
        routes: vec![
            RouteConfig {
                prefix: "/api/inscripcion".into(),
                backend: format!("http://{enrollment}"),
                policy: Policy::Protected,
                strip_prefix: true,
            },
            RouteConfig {
                prefix: "/api/curso".into(),
                backend: format!("http://{courses}"),
                policy: Policy::Public,
                strip_prefix: true,
            },
        ],
    }
}
