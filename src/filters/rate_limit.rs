//! Token-bucket rate limiting as a route filter.
//!
//! Buckets are keyed by route (method + registered path template) and client
//! IP, so changing a path-parameter value does not earn a fresh bucket. The client IP
//! comes from the connection info the server attaches to each request;
//! requests without it share one bucket per route.

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use dashmap::DashMap;

use crate::gateway::{ErrorKind, Filter, FilterError, FilterProperties, ProxyResponse, Route};

const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;

/// A simple token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Limits {
    requests_per_second: f64,
    burst: f64,
}

impl Limits {
    fn from_properties(properties: Option<&FilterProperties>) -> Result<Self, FilterError> {
        let requests_per_second =
            number(properties, "requests_per_second")?.unwrap_or(DEFAULT_REQUESTS_PER_SECOND);
        let burst = number(properties, "burst")?.unwrap_or(requests_per_second);
        Ok(Self {
            requests_per_second,
            burst,
        })
    }
}

fn number(properties: Option<&FilterProperties>, key: &str) -> Result<Option<f64>, FilterError> {
    let Some(raw) = properties
        .and_then(|properties| properties.get(key))
        .and_then(|values| values.first())
    else {
        return Ok(None);
    };

    match raw.trim().parse::<f64>() {
        Ok(value) if value > 0.0 && value.is_finite() => Ok(Some(value)),
        _ => Err(FilterError::new(
            ErrorKind::Internal,
            format!("rate-limit property `{key}` must be a positive number, got `{raw}`"),
        )),
    }
}

/// Per route and client token buckets.
#[derive(Debug, Default)]
pub struct RateLimit {
    buckets: DashMap<String, TokenBucket>,
}

impl RateLimit {
    pub const NAME: &'static str = "rate-limit";

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked (route, client) pairs.
    pub fn tracked(&self) -> usize {
        self.buckets.len()
    }
}

impl Filter for RateLimit {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(
        &self,
        route: &Route,
        request: &mut Request<Body>,
        _response: &mut ProxyResponse,
    ) -> Result<(), FilterError> {
        let limits = Limits::from_properties(route.filter_properties(Self::NAME))?;

        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let key = format!("{} {}|{}", route.method(), route.template(), client);

        let allowed = self
            .buckets
            .entry(key)
            .or_insert_with(|| TokenBucket::new(limits.burst))
            .try_acquire(limits.burst, limits.requests_per_second);

        if allowed {
            Ok(())
        } else {
            tracing::warn!(client = %client, path = %route.path(), "Rate limit exceeded");
            Err(FilterError::too_many_requests("rate limit exceeded"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{PathParams, RouteFilter};

    fn route(rps: &str, burst: &str) -> Route {
        Route::new("/uuid", "GET", "http://backend/uuid")
            .unwrap()
            .with_filter(
                RouteFilter::new(RateLimit::NAME)
                    .property("requests_per_second", [rps])
                    .property("burst", [burst]),
            )
    }

    fn request_from(ip: [u8; 4]) -> Request<Body> {
        let mut request = Request::new(Body::empty());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
        request
    }

    #[test]
    fn test_token_bucket_exhausts() {
        let mut bucket = TokenBucket::new(2.0);
        assert!(bucket.try_acquire(2.0, 0.001));
        assert!(bucket.try_acquire(2.0, 0.001));
        assert!(!bucket.try_acquire(2.0, 0.001));
    }

    #[test]
    fn test_burst_then_reject() {
        let limiter = RateLimit::new();
        let route = route("0.001", "2");
        let mut response = ProxyResponse::new();

        for _ in 0..2 {
            assert!(limiter
                .apply(&route, &mut request_from([10, 0, 0, 1]), &mut response)
                .is_ok());
        }
        let err = limiter
            .apply(&route, &mut request_from([10, 0, 0, 1]), &mut response)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyRequests);
    }

    #[test]
    fn test_clients_have_separate_buckets() {
        let limiter = RateLimit::new();
        let route = route("0.001", "1");
        let mut response = ProxyResponse::new();

        assert!(limiter
            .apply(&route, &mut request_from([10, 0, 0, 1]), &mut response)
            .is_ok());
        assert!(limiter
            .apply(&route, &mut request_from([10, 0, 0, 2]), &mut response)
            .is_ok());
        assert_eq!(limiter.tracked(), 2);
    }

    #[test]
    fn test_parameter_values_share_one_bucket() {
        let limiter = RateLimit::new();
        let route = Route::new("/kinds/:kind", "GET", "http://backend/items/:kind")
            .unwrap()
            .with_filter(
                RouteFilter::new(RateLimit::NAME)
                    .property("requests_per_second", ["0.001"])
                    .property("burst", ["1"]),
            );
        let mut response = ProxyResponse::new();

        let mut allowed = 0;
        for value in ["v0", "v1", "v2", "v3", "v4"] {
            let params = PathParams::from([("kind".to_string(), value.to_string())]);
            match limiter.apply(
                &route.enrich(&params),
                &mut request_from([10, 0, 0, 1]),
                &mut response,
            ) {
                Ok(()) => allowed += 1,
                Err(err) => assert_eq!(err.kind(), ErrorKind::TooManyRequests),
            }
        }

        assert_eq!(allowed, 1);
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_defaults_without_properties() {
        let limits = Limits::from_properties(None).unwrap();
        assert_eq!(limits.requests_per_second, DEFAULT_REQUESTS_PER_SECOND);
        assert_eq!(limits.burst, DEFAULT_REQUESTS_PER_SECOND);
    }

    #[test]
    fn test_invalid_property() {
        let limiter = RateLimit::new();
        let err = limiter
            .apply(
                &route("fast", "1"),
                &mut request_from([10, 0, 0, 1]),
                &mut ProxyResponse::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
