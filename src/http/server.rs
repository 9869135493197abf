//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all gateway handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Check gateway preconditions before binding
//! - Match routes, enrich them and hand requests to the gateway pipeline
//! - Swap in reloaded route tables while serving

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, TimeoutConfig};
use crate::gateway::{GatewayState, RouteError, StartupError};
use crate::http::request_id::{request_id, UuidRequestId};
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
    pub routes: Arc<ArcSwap<RouteTable>>,
}

impl AppState {
    /// Replaces the route table from a reloaded configuration.
    ///
    /// On error the current table stays in place.
    pub fn apply_config(&self, config: &GatewayConfig) -> Result<usize, RouteError> {
        let table = RouteTable::new(config.build_routes()?);
        self.gateway.check_routes(table.routes());
        let count = table.len();
        self.routes.store(Arc::new(table));
        Ok(count)
    }
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    state: AppState,
}

impl GatewayServer {
    /// Builds the server.
    ///
    /// Fails when the gateway has no default error handler.
    pub fn new(
        gateway: Arc<GatewayState>,
        routes: RouteTable,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, StartupError> {
        gateway.validate_dependencies()?;
        gateway.check_routes(routes.routes());

        let state = AppState {
            gateway,
            routes: Arc::new(ArcSwap::from_pointee(routes)),
        };
        let router = Self::build_router(timeouts, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(timeouts: &TimeoutConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The configured router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Validated configurations received on `config_updates` replace the
    /// route table. Returns once `shutdown` fires and connections drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.routes.load().len(),
            "HTTP server starting"
        );

        let state = self.state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match state.apply_config(&config) {
                    Ok(count) => tracing::info!(routes = count, "Route table reloaded"),
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected reloaded routes, keeping current table")
                    }
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                if let Err(e) = shutdown.recv().await {
                    tracing::warn!(error = %e, "Shutdown channel closed");
                }
                tracing::info!("Draining connections");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Matches the request, enriches the route and runs the gateway pipeline.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let matched = state
        .routes
        .load()
        .match_request(request.method(), request.uri().path());

    let Some(matched) = matched else {
        tracing::debug!(
            request_id = %request_id(&request),
            method = %request.method(),
            path = %request.uri().path(),
            "No route matched"
        );
        return not_found(&request);
    };

    let route = matched.enriched();
    tracing::debug!(
        request_id = %request_id(&request),
        method = %route.method(),
        path = %route.path(),
        target = %route.target(),
        "Route matched"
    );

    state.gateway.process(&route, request).await
}

fn not_found(request: &Request<Body>) -> Response {
    let message = format!("no route for {} {}", request.method(), request.uri().path());
    (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
}
