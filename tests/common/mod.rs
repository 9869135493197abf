//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use filter_gateway::config::{GatewayConfig, ProxyConfig, TimeoutConfig};
use filter_gateway::filters::register_builtin;
use filter_gateway::gateway::{GatewayState, Route};
use filter_gateway::handlers::{json_default_handler, standard_handlers};
use filter_gateway::proxy::ReverseProxy;
use filter_gateway::routing::RouteTable;
use filter_gateway::{GatewayServer, Shutdown};

/// Start a raw-TCP mock backend that answers every request with a fixed
/// status line and body.
pub async fn start_mock_backend(status: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a backend that echoes method, path, query and headers as JSON and
/// sets the full set of CORS headers on its response.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

async fn echo(request: Request<Body>) -> impl IntoResponse {
    let headers: Map<String, Value> = request
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                Value::from(value.to_str().unwrap_or_default()),
            )
        })
        .collect();

    let body = json!({
        "method": request.method().as_str(),
        "path": request.uri().path(),
        "query": request.uri().query().unwrap_or_default(),
        "headers": headers,
    });

    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
            (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
            (header::ACCESS_CONTROL_MAX_AGE, "600"),
            (header::ACCESS_CONTROL_EXPOSE_HEADERS, "x-backend"),
        ],
        [(header::HeaderName::from_static("x-backend"), "echo")],
        Json(body),
    )
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running gateway bound to an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Arc<Shutdown>,
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway with the built-in filters, the standard handlers and a
/// JSON default handler.
pub async fn start_gateway(routes: Vec<Route>) -> TestGateway {
    let timeouts = TimeoutConfig::default();
    let proxy = ReverseProxy::new(&ProxyConfig::default(), &timeouts).unwrap();
    let gateway = GatewayState::new(proxy);
    register_builtin(&gateway);
    for handler in standard_handlers() {
        gateway.register_custom_handler(handler);
    }
    gateway.register_default_handler(json_default_handler(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error",
    ));

    let server = GatewayServer::new(Arc::new(gateway), RouteTable::new(routes), &timeouts).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Shutdown::new());
    let (updates, update_rx) = mpsc::unbounded_channel();

    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, update_rx, signal).await;
    });

    TestGateway {
        addr,
        shutdown,
        updates,
    }
}
