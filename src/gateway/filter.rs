//! Filter registry and chain executor.
//!
//! # Responsibilities
//! - Hold the name → filter mapping for one gateway instance
//! - Run a route's filter references in declaration order
//!
//! # Design Decisions
//! - Immutable snapshot on write (`ArcSwap`): readers never block and never
//!   see a half-applied registration
//! - Last registration for a name wins
//! - A filter name with no registered implementation is skipped, not an error
//! - The first failing filter stops the chain; earlier side effects stay

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::Request;

use crate::gateway::error::{FilterError, GatewayError};
use crate::gateway::response::ProxyResponse;
use crate::gateway::route::Route;

/// A named request-processing step run before forwarding.
///
/// Implementations may inspect or modify the request, write headers or a
/// status to the pending response, or reject the request with a
/// [`FilterError`]. Route-scoped configuration is available through
/// [`Route::filter_properties`].
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    fn apply(
        &self,
        route: &Route,
        request: &mut Request<Body>,
        response: &mut ProxyResponse,
    ) -> Result<(), FilterError>;
}

type FilterMap = HashMap<String, Arc<dyn Filter>>;

/// Name → filter mapping.
pub struct FilterRegistry {
    filters: ArcSwap<FilterMap>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self {
            filters: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Inserts or replaces the filter stored under `filter.name()`.
    pub fn register(&self, filter: Arc<dyn Filter>) {
        let name = filter.name().to_string();
        self.filters.rcu(|current| {
            let mut next = FilterMap::clone(current);
            next.insert(name.clone(), Arc::clone(&filter));
            next
        });
        tracing::debug!(filter = %name, "Filter registered");
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Filter>> {
        self.filters.load().get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.filters.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Filter names referenced by `route` that have no implementation.
    pub fn missing(&self, route: &Route) -> Vec<String> {
        let snapshot = self.filters.load();
        route
            .filters()
            .iter()
            .filter(|reference| !snapshot.contains_key(&reference.name))
            .map(|reference| reference.name.clone())
            .collect()
    }

    /// Runs the route's filters in order against one registry snapshot.
    pub fn apply_filters(
        &self,
        route: &Route,
        request: &mut Request<Body>,
        response: &mut ProxyResponse,
    ) -> Result<(), GatewayError> {
        let snapshot = self.filters.load();

        for reference in route.filters() {
            let Some(filter) = snapshot.get(&reference.name) else {
                tracing::debug!(filter = %reference.name, path = %route.path(), "Skipping unregistered filter");
                continue;
            };

            filter
                .apply(route, request, response)
                .map_err(|source| GatewayError::Filter {
                    filter: reference.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
