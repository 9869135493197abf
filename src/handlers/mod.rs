//! Built-in error handlers.
//!
//! Both kinds write a small JSON body, `{"message": "..."}`, so callers see
//! the same error shape whichever handler answered.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use crate::gateway::{ErrorHandler, ErrorKind, ProxyResponse, Route};

/// Custom handler answering one error kind with a fixed status.
#[derive(Debug, Clone)]
pub struct StatusHandler {
    kind: ErrorKind,
    status: StatusCode,
}

impl StatusHandler {
    pub fn new(kind: ErrorKind, status: StatusCode) -> Self {
        Self { kind, status }
    }
}

impl ErrorHandler for StatusHandler {
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn handle(&self, _route: &Route, _request: &Request<Body>, response: &mut ProxyResponse) {
        let message = self.status.canonical_reason().unwrap_or("error");
        response.json(self.status, &json!({ "message": message }));
    }
}

/// Handlers for the kinds raised by this crate and its built-in filters.
pub fn standard_handlers() -> Vec<Arc<dyn ErrorHandler>> {
    [
        (ErrorKind::Unauthorized, StatusCode::UNAUTHORIZED),
        (ErrorKind::Forbidden, StatusCode::FORBIDDEN),
        (ErrorKind::TooManyRequests, StatusCode::TOO_MANY_REQUESTS),
        (ErrorKind::BadRequest, StatusCode::BAD_REQUEST),
        (ErrorKind::InvalidTarget, StatusCode::BAD_GATEWAY),
        (ErrorKind::Upstream, StatusCode::BAD_GATEWAY),
    ]
    .into_iter()
    .map(|(kind, status)| Arc::new(StatusHandler::new(kind, status)) as Arc<dyn ErrorHandler>)
    .collect()
}

/// Default handler writing `message` with `status`.
pub fn json_default_handler(
    status: StatusCode,
    message: impl Into<String>,
) -> impl Fn(&Route, &Request<Body>, &mut ProxyResponse) + Send + Sync + 'static {
    let body = json!({ "message": message.into() });
    move |_route: &Route, _request: &Request<Body>, response: &mut ProxyResponse| {
        response.json(status, &body)
    }
}
