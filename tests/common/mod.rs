//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{header, Request, Response, StatusCode},
    routing::post,
    Router,
};
use futures_util::stream;
use relay_gateway::config::GatewayConfig;
use relay_gateway::http::GatewayServer;
use relay_gateway::lifecycle::Shutdown;
use serde_json::Value;
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";

/// Defaults with a known token and no pacing between scrape pages.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.security.auth_token = TOKEN.to_string();
    config.scraper.pace_ms = 0;
    config
}

/// Serve `router` on an ephemeral loopback port.
pub async fn spawn_app(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Run a gateway on an ephemeral loopback port. Trigger the returned
/// coordinator to stop it.
pub async fn spawn_gateway(server: GatewayServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// In-process request carrying `peer` as its socket address.
pub fn request_from(
    peer: &str,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let mut request = builder.body(body).unwrap();
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

/// Loopback request with the test token.
pub fn authorized(method: &str, uri: &str, body: Value) -> Request<Body> {
    request_from("127.0.0.1:40000", method, uri, Some(TOKEN), Some(body))
}

pub async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Upstream that streams `b1`, `b2`, `b3` with a pause between chunks and
/// framing headers the gateway must not relay.
pub fn streaming_upstream() -> Router {
    Router::new().route(
        "/{*path}",
        post(|| async {
            let chunks = stream::unfold(1u8, |n| async move {
                if n > 3 {
                    return None;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
                Some((Ok::<_, Infallible>(Bytes::from(format!("b{}", n))), n + 1))
            });
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_ENCODING, "identity")
                .header("x-upstream-trace", "t-1")
                .body(Body::from_stream(chunks))
                .unwrap()
        }),
    )
}

/// Upstream that sends `count` chunks `c0..` with `gap` before each one.
pub fn slow_upstream(count: u8, gap: Duration) -> Router {
    Router::new().route(
        "/{*path}",
        post(move || async move {
            let chunks = stream::unfold(0u8, move |n| async move {
                if n >= count {
                    return None;
                }
                tokio::time::sleep(gap).await;
                Some((Ok::<_, Infallible>(Bytes::from(format!("c{}", n))), n + 1))
            });
            Response::new(Body::from_stream(chunks))
        }),
    )
}

/// Upstream that sends one chunk and then stalls forever.
pub fn stalled_upstream() -> Router {
    Router::new().route(
        "/{*path}",
        post(|| async {
            let first = stream::once(async { Ok::<_, Infallible>(Bytes::from_static(b"partial")) });
            let chunks = futures_util::StreamExt::chain(first, stream::pending());
            Response::new(Body::from_stream(chunks))
        }),
    )
}

/// Upstream URL template pointing at `addr`.
pub fn upstream_template(addr: SocketAddr) -> String {
    format!("http://{}/v1beta/models/{{model}}:generateContent", addr)
}
