//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, status codes, bind address)
//! - Validate every route (method, path, target URL, filter names)
//! - Detect conflicting routes (same method + path declared twice)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::http::{HeaderName, StatusCode};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::gateway::RouteError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("observability.log_level `{0}` is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("proxy.strip_response_headers entry `{0}` is not a valid header name")]
    InvalidHeaderName(String),

    #[error("error_response.default_status `{0}` is not a valid HTTP status")]
    InvalidStatus(u16),

    #[error("routes[{index}]: {source}")]
    Route {
        index: usize,
        #[source]
        source: RouteError,
    },

    #[error("routes[{index}]: {method} {path} is already declared by routes[{first}]")]
    DuplicateRoute {
        index: usize,
        first: usize,
        method: String,
        path: String,
    },

    #[error("routes[{index}].filters[{filter}]: filter name must not be empty")]
    EmptyFilterName { index: usize, filter: usize },
}

/// Checks the whole configuration and reports every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    for (field, value) in [
        ("connect_secs", config.timeouts.connect_secs),
        ("request_secs", config.timeouts.request_secs),
        ("idle_secs", config.timeouts.idle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    for name in &config.proxy.strip_response_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    let status = config.error_response.default_status;
    if !(100..=599).contains(&status) || StatusCode::from_u16(status).is_err() {
        errors.push(ValidationError::InvalidStatus(status));
    }

    validate_routes(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut declared: HashMap<(&str, &str), usize> = HashMap::new();

    for (index, route) in config.routes.iter().enumerate() {
        if let Err(source) = route.to_route() {
            errors.push(ValidationError::Route { index, source });
        }

        for (filter, reference) in route.filters.iter().enumerate() {
            if reference.name.trim().is_empty() {
                errors.push(ValidationError::EmptyFilterName { index, filter });
            }
        }

        let key = (route.method.as_str(), route.path.as_str());
        if let Some(&first) = declared.get(&key) {
            errors.push(ValidationError::DuplicateRoute {
                index,
                first,
                method: route.method.clone(),
                path: route.path.clone(),
            });
        } else {
            declared.insert(key, index);
        }
    }
}
