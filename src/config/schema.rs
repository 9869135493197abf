//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::gateway::{Route, RouteError, RouteFilter};
use crate::proxy::DEFAULT_STRIPPED_HEADERS;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Outbound rewrite settings.
    pub proxy: ProxyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Body written by the default error handler.
    pub error_response: ErrorResponseConfig,

    /// Route definitions, matched in declaration order.
    pub routes: Vec<RouteConfig>,
}

impl GatewayConfig {
    /// Builds validated routes in declaration order.
    pub fn build_routes(&self) -> Result<Vec<Route>, RouteError> {
        self.routes.iter().map(RouteConfig::to_route).collect()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Outbound rewrite configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Headers removed from every backend response.
    pub strip_response_headers: Vec<String>,

    /// Set `X-Forwarded-For/Host/Proto` on outbound requests.
    pub forwarded_headers: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            strip_response_headers: DEFAULT_STRIPPED_HEADERS
                .iter()
                .map(|name| name.as_str().to_string())
                .collect(),
            forwarded_headers: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Response written when no custom error handler claims an error.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorResponseConfig {
    pub default_status: u16,
    pub default_message: String,
}

impl Default for ErrorResponseConfig {
    fn default() -> Self {
        Self {
            default_status: 500,
            default_message: "internal server error".to_string(),
        }
    }
}

/// One configured endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Inbound path template, may contain `:name` segments.
    pub path: String,

    /// GET, PUT, POST, PATCH or DELETE.
    pub method: String,

    /// Absolute backend URL, may contain the same `:name` placeholders.
    pub target: String,

    /// Filters applied in order before forwarding.
    #[serde(default)]
    pub filters: Vec<RouteFilter>,
}

impl RouteConfig {
    pub fn to_route(&self) -> Result<Route, RouteError> {
        Ok(Route::new(self.path.clone(), &self.method, self.target.clone())?
            .with_filters(self.filters.iter().cloned()))
    }
}
