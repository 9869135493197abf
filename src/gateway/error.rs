//! Error types for the request pipeline and for startup.
//!
//! # Design Decisions
//! - Request-scoped failures are [`GatewayError`] and always go through the
//!   error dispatcher; they are never written to the response directly
//! - Every request-scoped error exposes an [`ErrorKind`], which is what custom
//!   error handlers are registered against
//! - Startup failures ([`RouteError`], [`StartupError`]) are fatal and never
//!   become HTTP responses

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Classification used to pick an error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credentials missing or rejected.
    Unauthorized,
    /// Caller is known but not allowed.
    Forbidden,
    /// Rate limit exceeded.
    TooManyRequests,
    /// Request rejected as malformed by a filter.
    BadRequest,
    /// Route target could not be turned into an outbound request.
    InvalidTarget,
    /// Outbound call to the backend failed.
    Upstream,
    /// Anything else raised by a filter.
    Internal,
    /// Application-defined kind for filters supplied outside this crate.
    Custom(&'static str),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unauthorized => f.write_str("unauthorized"),
            ErrorKind::Forbidden => f.write_str("forbidden"),
            ErrorKind::TooManyRequests => f.write_str("too_many_requests"),
            ErrorKind::BadRequest => f.write_str("bad_request"),
            ErrorKind::InvalidTarget => f.write_str("invalid_target"),
            ErrorKind::Upstream => f.write_str("upstream"),
            ErrorKind::Internal => f.write_str("internal"),
            ErrorKind::Custom(name) => f.write_str(name),
        }
    }
}

/// Error returned by a filter's `apply`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FilterError {
    kind: ErrorKind,
    message: String,
}

impl FilterError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Request-scoped pipeline failure.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A filter short-circuited the chain.
    #[error("filter `{filter}` failed: {source}")]
    Filter {
        filter: String,
        #[source]
        source: FilterError,
    },

    /// The (enriched) route target does not parse as an absolute URL.
    #[error("invalid target URL `{target}`: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// The rewritten outbound request could not be assembled.
    #[error("failed to build outbound request: {0}")]
    BuildRequest(#[from] axum::http::Error),

    /// Transport failure talking to the backend.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

impl GatewayError {
    /// Kind used by the error dispatcher to select a handler.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Filter { source, .. } => source.kind(),
            GatewayError::InvalidTarget { .. } | GatewayError::BuildRequest(_) => {
                ErrorKind::InvalidTarget
            }
            GatewayError::Upstream(_) => ErrorKind::Upstream,
        }
    }
}

/// Route failed validation. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route method `{0}` is not supported (available methods: GET, PUT, POST, PATCH and DELETE)")]
    InvalidMethod(String),

    #[error("route path `{0}` must be non-empty and start with `/`")]
    InvalidPath(String),

    #[error("route target `{target}` is invalid: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("route target `{target}` uses unsupported scheme `{scheme}`")]
    UnsupportedScheme { target: String, scheme: String },
}

/// Fatal precondition failure before the gateway accepts traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("gateway default error handler not set")]
    MissingDefaultHandler,

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid header name in strip list: {0}")]
    InvalidHeaderName(#[from] axum::http::header::InvalidHeaderName),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
