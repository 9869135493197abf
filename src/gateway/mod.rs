//! Request pipeline core.
//!
//! # Data Flow
//! ```text
//! enriched Route + Request (from a router adapter)
//!     → filter.rs (registered filters, declaration order, first error stops)
//!     → proxy (rewrite, forward, relay)           on success
//!     → dispatcher.rs (one custom or default handler)  on any error
//!     → ProxyResponse → HTTP response
//! ```
//!
//! # Design Decisions
//! - One [`GatewayState`] per gateway instance, shared by `Arc`; no globals
//! - The core never depends on a concrete router; adapters hand in a route
//!   that already has its path parameters substituted

pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod response;
pub mod route;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;

use crate::proxy::ReverseProxy;

pub use dispatcher::{ErrorDispatcher, ErrorHandler};
pub use error::{ErrorKind, FilterError, GatewayError, RouteError, StartupError};
pub use filter::{Filter, FilterRegistry};
pub use response::ProxyResponse;
pub use route::{FilterProperties, Method, PathParams, Route, RouteFilter};

/// Registries plus the reverse proxy for one gateway instance.
pub struct GatewayState {
    filters: FilterRegistry,
    errors: ErrorDispatcher,
    proxy: ReverseProxy,
}

impl GatewayState {
    pub fn new(proxy: ReverseProxy) -> Self {
        Self {
            filters: FilterRegistry::new(),
            errors: ErrorDispatcher::new(),
            proxy,
        }
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn errors(&self) -> &ErrorDispatcher {
        &self.errors
    }

    pub fn proxy(&self) -> &ReverseProxy {
        &self.proxy
    }

    pub fn register_filter(&self, filter: Arc<dyn Filter>) {
        self.filters.register(filter);
    }

    pub fn register_custom_handler(&self, handler: Arc<dyn ErrorHandler>) {
        self.errors.register_custom_handler(handler);
    }

    pub fn register_default_handler<F>(&self, handler: F)
    where
        F: Fn(&Route, &Request<Body>, &mut ProxyResponse) + Send + Sync + 'static,
    {
        self.errors.register_default_handler(handler);
    }

    /// Must succeed before the gateway accepts traffic.
    pub fn validate_dependencies(&self) -> Result<(), StartupError> {
        self.errors.validate_dependencies()
    }

    /// Warns once per route that references unregistered filters.
    ///
    /// Returns the number of such routes. Unregistered filters are still
    /// skipped at request time.
    pub fn check_routes<'a>(&self, routes: impl IntoIterator<Item = &'a Route>) -> usize {
        let mut flagged = 0;
        for route in routes {
            let missing = self.filters.missing(route);
            if !missing.is_empty() {
                flagged += 1;
                tracing::warn!(
                    method = %route.method(),
                    path = %route.path(),
                    missing = ?missing,
                    "Route references unregistered filters; they will be skipped"
                );
            }
        }
        flagged
    }

    /// Runs the full pipeline for one matched request.
    ///
    /// Exactly one of the relayed backend response or one error handler's
    /// response is returned.
    pub async fn process(&self, route: &Route, mut request: Request<Body>) -> Response<Body> {
        let mut response = ProxyResponse::new();

        let outcome = match self.filters.apply_filters(route, &mut request, &mut response) {
            Ok(()) => self.proxy.forward(route, &mut request, &mut response).await,
            Err(err) => Err(err),
        };

        if let Err(err) = outcome {
            tracing::warn!(
                kind = %err.kind(),
                error = %err,
                method = %route.method(),
                path = %route.path(),
                "Request failed in gateway pipeline"
            );
            self.errors
                .handle_error(&err, route, &request, &mut response);
        }

        response.into_response()
    }
}
