//! Error dispatch.
//!
//! # Responsibilities
//! - Hold custom error handlers keyed by [`ErrorKind`]
//! - Hold the single mandatory default handler
//! - Select and run exactly one handler per failed request
//!
//! # Design Decisions
//! - O(1) lookup by kind instead of scanning for a sentinel value
//! - For a given kind the first registered handler keeps winning; later
//!   duplicates are logged and ignored
//! - The default slot doubles as the "is default set" flag, so the two can
//!   never disagree

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::gateway::error::{ErrorKind, GatewayError, StartupError};
use crate::gateway::response::ProxyResponse;
use crate::gateway::route::Route;

/// Handler bound to one error kind.
pub trait ErrorHandler: Send + Sync {
    fn kind(&self) -> ErrorKind;

    fn handle(&self, route: &Route, request: &Request<Body>, response: &mut ProxyResponse);
}

type DefaultFn = dyn Fn(&Route, &Request<Body>, &mut ProxyResponse) + Send + Sync;

struct DefaultHandler(Box<DefaultFn>);

pub struct ErrorDispatcher {
    custom: DashMap<ErrorKind, Arc<dyn ErrorHandler>>,
    default: ArcSwapOption<DefaultHandler>,
}

impl ErrorDispatcher {
    pub fn new() -> Self {
        Self {
            custom: DashMap::new(),
            default: ArcSwapOption::empty(),
        }
    }

    pub fn register_custom_handler(&self, handler: Arc<dyn ErrorHandler>) {
        let kind = handler.kind();
        match self.custom.entry(kind) {
            Entry::Occupied(_) => {
                tracing::warn!(kind = %kind, "Error handler already registered for kind, keeping the first one");
            }
            Entry::Vacant(slot) => {
                slot.insert(handler);
                tracing::debug!(kind = %kind, "Custom error handler registered");
            }
        }
    }

    /// Sets (or replaces) the fallback handler.
    pub fn register_default_handler<F>(&self, handler: F)
    where
        F: Fn(&Route, &Request<Body>, &mut ProxyResponse) + Send + Sync + 'static,
    {
        self.default
            .store(Some(Arc::new(DefaultHandler(Box::new(handler)))));
        tracing::debug!("Default error handler registered");
    }

    pub fn has_default_handler(&self) -> bool {
        self.default.load().is_some()
    }

    pub fn has_custom_handler(&self, kind: ErrorKind) -> bool {
        self.custom.contains_key(&kind)
    }

    /// Startup precondition: a default handler must exist.
    pub fn validate_dependencies(&self) -> Result<(), StartupError> {
        if self.has_default_handler() {
            Ok(())
        } else {
            Err(StartupError::MissingDefaultHandler)
        }
    }

    /// Runs the handler registered for `err.kind()`, or the default handler.
    pub fn handle_error(
        &self,
        err: &GatewayError,
        route: &Route,
        request: &Request<Body>,
        response: &mut ProxyResponse,
    ) {
        // Clone out of the map so no shard lock is held while the handler runs.
        let custom = self
            .custom
            .get(&err.kind())
            .map(|entry| Arc::clone(entry.value()));

        if let Some(handler) = custom {
            handler.handle(route, request, response);
            return;
        }

        match self.default.load_full() {
            Some(default) => (default.0)(route, request, response),
            None => {
                tracing::error!(error = %err, "No default error handler registered");
                response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                response.set_body(Body::empty());
            }
        }
    }
}

impl Default for ErrorDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
