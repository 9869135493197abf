//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes with their path templates
//! - Look up the matching route for a method + path
//! - Return the route and its extracted parameters, or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) template scan (acceptable for typical route counts)
//! - Methods outside the five route methods never match

use std::sync::Arc;

use crate::gateway::{Method, PathParams, Route};
use crate::routing::matcher::{ParamExtractor, PathTemplate};

/// A matched route plus the parameters taken from the request path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: PathParams,
}

impl RouteMatch {
    /// Per-request copy of the route with parameters substituted.
    pub fn enriched(&self) -> Route {
        self.route.enrich(&self.params)
    }
}

#[derive(Debug)]
struct CompiledRoute {
    route: Arc<Route>,
    template: PathTemplate,
}

/// Routes in declaration order.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        let routes = routes
            .into_iter()
            .map(|route| CompiledRoute {
                template: PathTemplate::new(route.path()),
                route: Arc::new(route),
            })
            .collect();
        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|compiled| compiled.route.as_ref())
    }

    /// First route whose method and template match.
    pub fn match_request(&self, method: &axum::http::Method, path: &str) -> Option<RouteMatch> {
        let method = Method::from_http(method)?;

        self.routes
            .iter()
            .filter(|compiled| compiled.route.method() == method)
            .find_map(|compiled| {
                compiled.template.extract(path).map(|params| RouteMatch {
                    route: Arc::clone(&compiled.route),
                    params,
                })
            })
    }
}
