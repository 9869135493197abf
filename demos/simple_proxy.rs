//! Minimal embedding: one route, no filters, JSON default error handler.
//!
//! ```text
//! cargo run --example simple_proxy
//! curl http://127.0.0.1:8080/uuid
//! ```

use std::sync::Arc;

use axum::http::StatusCode;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use filter_gateway::config::{ObservabilityConfig, ProxyConfig, TimeoutConfig};
use filter_gateway::gateway::{GatewayState, Route};
use filter_gateway::handlers::json_default_handler;
use filter_gateway::observability::logging;
use filter_gateway::proxy::ReverseProxy;
use filter_gateway::routing::RouteTable;
use filter_gateway::{GatewayServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&ObservabilityConfig::default());

    let timeouts = TimeoutConfig::default();
    let gateway = GatewayState::new(ReverseProxy::new(&ProxyConfig::default(), &timeouts)?);
    gateway.register_default_handler(json_default_handler(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error",
    ));

    let routes = RouteTable::new(vec![Route::new("/uuid", "GET", "https://httpbin.org/uuid")?]);
    let server = GatewayServer::new(Arc::new(gateway), routes, &timeouts)?;

    let shutdown = Arc::new(Shutdown::new());
    shutdown.trigger_on_ctrl_c();

    let (_updates_tx, updates) = mpsc::unbounded_channel();
    let listener = TcpListener::bind("127.0.0.1:8080").await?;
    server.run(listener, updates, shutdown.subscribe()).await?;
    Ok(())
}
