//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use route_service::config::ServiceConfig;
use route_service::net::tls::load_tls_config;
use route_service::observability::RecordingObserver;
use route_service::HttpServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const FORWARDED_URL: &str = "x-cf-forwarded-url";
#[allow(dead_code)]
pub const PROXY_SIGNATURE: &str = "x-cf-proxy-signature";

#[allow(dead_code)]
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[allow(dead_code)]
pub fn fixture_tls_config() -> RustlsConfig {
    load_tls_config(&fixture("localhost.crt"), &fixture("localhost.key")).unwrap()
}

/// Start a plain HTTP backend serving `router`.
pub async fn start_backend(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start an HTTPS backend presenting the self-signed `localhost` certificate.
#[allow(dead_code)]
pub async fn start_tls_backend(router: Router) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    let tls = fixture_tls_config();
    tokio::spawn(async move {
        let _ = axum_server::from_tcp_rustls(listener, tls)
            .serve(router.into_make_service())
            .await;
    });
    addr
}

/// Backend that promises more body bytes than it sends, then hangs up.
#[allow(dead_code)]
pub async fn start_truncating_backend() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\npartial")
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// Backend that answers with the request body and reports what it saw.
///
/// - `x-echo-method` / `x-echo-target`: method and request target received
/// - `x-seen-<name>`: every request header received
/// - `x-echo-status` request header picks the response status
/// - Always sets two `set-cookie` headers
pub fn echo_router() -> Router {
    Router::new().fallback(echo)
}

async fn echo(request: Request<Body>) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let status = parts
        .headers
        .get("x-echo-status")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(200);

    let mut builder = Response::builder()
        .status(status)
        .header("x-echo-method", parts.method.as_str())
        .header("x-echo-target", parts.uri.to_string())
        .header("set-cookie", "session=abc; Path=/")
        .header("set-cookie", "theme=dark; Path=/");
    for (name, value) in parts.headers.iter() {
        builder = builder.header(format!("x-seen-{}", name), value);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Route-service router reporting into a recording observer.
pub fn proxy(config: ServiceConfig) -> (Router, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::new());
    let server = HttpServer::with_observer(config, observer.clone()).unwrap();
    (server.router(), observer)
}
