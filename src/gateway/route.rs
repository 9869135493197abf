//! Route model.
//!
//! # Responsibilities
//! - Describe one inbound path + method mapped to a backend target URL
//! - Carry the ordered list of filter references with their properties
//! - Validate method and target once, at construction
//! - Derive per-request enriched copies with path parameters substituted
//!
//! # Design Decisions
//! - The target is kept as the raw configured string so that placeholders
//!   (`:id`) survive until enrichment; it is re-parsed per request
//! - Enrichment is plain string substitution on a copy, never on the
//!   registered route

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::gateway::error::{GatewayError, RouteError};

/// Route-scoped filter configuration.
pub type FilterProperties = HashMap<String, Vec<String>>;

/// Path parameters extracted by a router adapter.
pub type PathParams = HashMap<String, String>;

/// The five methods a route can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Maps an inbound request method; anything outside the five is `None`.
    pub fn from_http(method: &axum::http::Method) -> Option<Self> {
        method.as_str().parse().ok()
    }

    pub fn to_http(self) -> axum::http::Method {
        match self {
            Method::Get => axum::http::Method::GET,
            Method::Put => axum::http::Method::PUT,
            Method::Post => axum::http::Method::POST,
            Method::Patch => axum::http::Method::PATCH,
            Method::Delete => axum::http::Method::DELETE,
        }
    }
}

impl FromStr for Method {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "PUT" => Ok(Method::Put),
            "POST" => Ok(Method::Post),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(RouteError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named filter reference on a route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteFilter {
    pub name: String,

    #[serde(default)]
    pub properties: FilterProperties,
}

impl RouteFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Adds a property. Returns `self` for chaining.
    pub fn property<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.properties
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }
}

/// Immutable mapping from an inbound path + method to a backend target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    template: String,
    path: String,
    method: Method,
    target: String,
    filters: Vec<RouteFilter>,
}

impl Route {
    /// Builds and validates a route.
    ///
    /// Fails when the method is not one of GET, PUT, POST, PATCH, DELETE, when
    /// the path does not start with `/`, or when the target is not an absolute
    /// `http`/`https` URL.
    pub fn new(
        path: impl Into<String>,
        method: &str,
        target: impl Into<String>,
    ) -> Result<Self, RouteError> {
        let path = path.into();
        let route = Self {
            template: path.clone(),
            path,
            method: method.parse()?,
            target: target.into(),
            filters: Vec::new(),
        };
        route.validate()?;
        Ok(route)
    }

    /// Skips validation; lets tests model routes handed over by other adapters.
    #[cfg(test)]
    pub(crate) fn unchecked(path: &str, method: Method, target: &str) -> Self {
        Self {
            template: path.to_string(),
            path: path.to_string(),
            method,
            target: target.to_string(),
            filters: Vec::new(),
        }
    }

    /// Appends a filter reference. Returns `self` for chaining.
    pub fn with_filter(mut self, filter: RouteFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = RouteFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Re-checks path and target. The method is valid by construction.
    pub fn validate(&self) -> Result<(), RouteError> {
        if !self.path.starts_with('/') {
            return Err(RouteError::InvalidPath(self.path.clone()));
        }

        let url = parse_target(&self.target).map_err(|source| RouteError::InvalidTarget {
            target: self.target.clone(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(RouteError::UnsupportedScheme {
                target: self.target.clone(),
                scheme: scheme.to_string(),
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path as registered, placeholders included. Enrichment leaves it alone.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Raw configured target, placeholders included.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn filters(&self) -> &[RouteFilter] {
        &self.filters
    }

    /// Parses the target for forwarding.
    pub fn target_url(&self) -> Result<Url, GatewayError> {
        parse_target(&self.target).map_err(|source| GatewayError::InvalidTarget {
            target: self.target.clone(),
            source,
        })
    }

    /// Properties of the first filter reference named `name`.
    pub fn filter_properties(&self, name: &str) -> Option<&FilterProperties> {
        self.filters
            .iter()
            .find(|filter| filter.name == name)
            .map(|filter| &filter.properties)
    }

    /// Returns a copy with every `:name` placeholder in the path and target
    /// replaced by the matching parameter value.
    pub fn enrich(&self, params: &PathParams) -> Route {
        let mut enriched = self.clone();
        if params.is_empty() {
            return enriched;
        }

        // Longest names first so `:id` cannot clobber `:id2`.
        let mut ordered: Vec<(&String, &String)> = params.iter().collect();
        ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

        for (name, value) in ordered {
            let placeholder = format!(":{name}");
            enriched.path = enriched.path.replace(&placeholder, value);
            enriched.target = enriched.target.replace(&placeholder, value);
        }
        enriched
    }
}

fn parse_target(raw: &str) -> Result<Url, url::ParseError> {
    let url = Url::parse(raw)?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(url::ParseError::EmptyHost);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_route() {
        let route = Route::new("/uuid", "GET", "https://httpbin.org/uuid").unwrap();
        assert_eq!(route.path(), "/uuid");
        assert_eq!(route.method(), Method::Get);
        assert_eq!(route.target_url().unwrap().as_str(), "https://httpbin.org/uuid");
    }

    #[test]
    fn test_invalid_method_rejected() {
        let err = Route::new("/uuid", "UNKNOWN", "https://httpbin.org/uuid").unwrap_err();
        assert_eq!(err, RouteError::InvalidMethod("UNKNOWN".into()));

        // Case-sensitive per RFC 9110.
        assert!(Route::new("/uuid", "get", "https://httpbin.org/uuid").is_err());
    }

    #[test]
    fn test_every_supported_method_parses() {
        for name in ["GET", "PUT", "POST", "PATCH", "DELETE"] {
            let method: Method = name.parse().unwrap();
            assert_eq!(method.as_str(), name);
            assert_eq!(method.to_http().as_str(), name);
        }
        assert!(Method::from_http(&axum::http::Method::HEAD).is_none());
        assert!(Method::from_http(&axum::http::Method::OPTIONS).is_none());
    }

    #[test]
    fn test_invalid_target_rejected() {
        let err = Route::new("/uuid", "GET", "https://exa mple.com/uuid").unwrap_err();
        assert!(matches!(err, RouteError::InvalidTarget { .. }));

        let err = Route::new("/uuid", "GET", "uuid").unwrap_err();
        assert!(matches!(err, RouteError::InvalidTarget { .. }));

        let err = Route::new("/uuid", "GET", "ftp://files.example.com/uuid").unwrap_err();
        assert!(matches!(err, RouteError::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_invalid_path_rejected() {
        let err = Route::new("uuid", "GET", "https://httpbin.org/uuid").unwrap_err();
        assert_eq!(err, RouteError::InvalidPath("uuid".into()));
    }

    #[test]
    fn test_filter_properties() {
        let route = Route::new("/uuid", "GET", "https://httpbin.org/uuid")
            .unwrap()
            .with_filter(RouteFilter::new("auth").property("header", ["authorization"]))
            .with_filter(RouteFilter::new("auth").property("header", ["ignored"]));

        let props = route.filter_properties("auth").unwrap();
        assert_eq!(props["header"], vec!["authorization".to_string()]);
        assert!(route.filter_properties("missing").is_none());
    }

    #[test]
    fn test_enrich_substitutes_placeholders_on_a_copy() {
        let route = Route::new(
            "/kinds/:path_param",
            "GET",
            "https://www.ecommerce.com.br/:path_param?sort=-SKU",
        )
        .unwrap();

        let params = PathParams::from([("path_param".to_string(), "product_kind".to_string())]);
        let enriched = route.enrich(&params);

        assert_eq!(
            enriched.target(),
            "https://www.ecommerce.com.br/product_kind?sort=-SKU"
        );
        assert_eq!(enriched.path(), "/kinds/product_kind");
        assert_eq!(enriched.template(), "/kinds/:path_param");
        // Registered route untouched.
        assert_eq!(
            route.target(),
            "https://www.ecommerce.com.br/:path_param?sort=-SKU"
        );
    }

    #[test]
    fn test_enrich_prefers_longer_names() {
        let route = Route::new("/a/:id/:id2", "GET", "http://backend/:id/:id2").unwrap();
        let params = PathParams::from([
            ("id".to_string(), "1".to_string()),
            ("id2".to_string(), "2".to_string()),
        ]);
        assert_eq!(route.enrich(&params).target(), "http://backend/1/2");
    }
}
