//! Filter-chain API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                     GATEWAY                          │
//!                        │                                                      │
//!   Client Request       │  ┌──────────┐    ┌──────────┐    ┌──────────────┐    │
//!   ─────────────────────┼─▶│   http   │───▶│ routing  │───▶│ Route::enrich│    │
//!                        │  │  server  │    │  table   │    └──────┬───────┘    │
//!                        │  └──────────┘    └──────────┘           │            │
//!                        │                                         ▼            │
//!                        │                                 ┌──────────────┐     │
//!                        │                                 │ filter chain │     │
//!                        │                                 └──┬────────┬──┘     │
//!                        │                               ok   │        │ error  │
//!                        │                                    ▼        ▼        │
//!   Client Response      │                          ┌─────────────┐ ┌─────────┐ │
//!   ◀────────────────────┼──────────────────────────│    proxy    │ │  error  │ │
//!                        │                          │ rewrite+fwd │ │dispatch │ │   Backend
//!                        │                          └──────┬──────┘ └─────────┘ │
//!                        │                                 └────────────────────┼──▶
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::StatusCode;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use filter_gateway::config::{
    load_config, ConfigError, ConfigWatcher, GatewayConfig, ObservabilityConfig,
};
use filter_gateway::filters::register_builtin;
use filter_gateway::gateway::GatewayState;
use filter_gateway::handlers::{json_default_handler, standard_handlers};
use filter_gateway::observability::logging;
use filter_gateway::proxy::ReverseProxy;
use filter_gateway::routing::RouteTable;
use filter_gateway::{GatewayServer, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "filter-gateway", version, about = "API gateway with per-route filter chains")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "config/gateway.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,

    /// Reload routes when the configuration file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_or_report(&cli.config)?;
    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "filter-gateway starting"
    );

    let routes = RouteTable::new(config.build_routes()?);
    let gateway = Arc::new(build_gateway(&config)?);

    if cli.check {
        gateway.validate_dependencies()?;
        let flagged = gateway.check_routes(routes.routes());
        tracing::info!(routes = routes.len(), flagged, "Configuration is valid");
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let server = GatewayServer::new(Arc::clone(&gateway), routes, &config.timeouts)?;

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = if cli.watch {
        let (watcher, updates) = ConfigWatcher::new(&cli.config);
        (Some(watcher.run()?), updates)
    } else {
        let (_tx, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    let shutdown = Arc::new(Shutdown::new());
    shutdown.trigger_on_ctrl_c();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Loads the configuration. A failure is logged through a default subscriber
/// before it is returned, since the configured one is not known yet.
fn load_or_report(path: &Path) -> Result<GatewayConfig, ConfigError> {
    load_config(path).inspect_err(|e| {
        logging::init(&ObservabilityConfig::default());
        tracing::error!(config = ?path, error = %e, "Failed to load configuration");
    })
}

fn build_gateway(config: &GatewayConfig) -> Result<GatewayState, Box<dyn std::error::Error>> {
    let proxy = ReverseProxy::new(&config.proxy, &config.timeouts)?;
    let gateway = GatewayState::new(proxy);

    register_builtin(&gateway);
    for handler in standard_handlers() {
        gateway.register_custom_handler(handler);
    }

    let status = StatusCode::from_u16(config.error_response.default_status)?;
    gateway.register_default_handler(json_default_handler(
        status,
        config.error_response.default_message.clone(),
    ));
    Ok(gateway)
}
