//! Header filters.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};

use crate::gateway::{ErrorKind, Filter, FilterError, FilterProperties, ProxyResponse, Route};

/// Sets request headers from the filter properties before forwarding.
pub struct SetRequestHeader;

/// Sets headers on the pending response; backend headers are appended after.
pub struct SetResponseHeader;

/// Rejects requests missing any header listed under the `header` property.
pub struct RequireHeader;

impl SetRequestHeader {
    pub const NAME: &'static str = "set-request-header";
}

impl SetResponseHeader {
    pub const NAME: &'static str = "set-response-header";
}

impl RequireHeader {
    pub const NAME: &'static str = "require-header";
}

impl Filter for SetRequestHeader {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(
        &self,
        route: &Route,
        request: &mut Request<Body>,
        _response: &mut ProxyResponse,
    ) -> Result<(), FilterError> {
        match route.filter_properties(Self::NAME) {
            Some(properties) => set_headers(request.headers_mut(), properties),
            None => Ok(()),
        }
    }
}

impl Filter for SetResponseHeader {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(
        &self,
        route: &Route,
        _request: &mut Request<Body>,
        response: &mut ProxyResponse,
    ) -> Result<(), FilterError> {
        match route.filter_properties(Self::NAME) {
            Some(properties) => set_headers(response.headers_mut(), properties),
            None => Ok(()),
        }
    }
}

impl Filter for RequireHeader {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(
        &self,
        route: &Route,
        request: &mut Request<Body>,
        _response: &mut ProxyResponse,
    ) -> Result<(), FilterError> {
        let required = route
            .filter_properties(Self::NAME)
            .and_then(|properties| properties.get("header"));

        for name in required.into_iter().flatten() {
            if !request.headers().contains_key(name.as_str()) {
                return Err(FilterError::unauthorized(format!(
                    "missing required header `{name}`"
                )));
            }
        }
        Ok(())
    }
}

/// Replaces each named header with the configured values.
fn set_headers(headers: &mut HeaderMap, properties: &FilterProperties) -> Result<(), FilterError> {
    for (key, values) in properties {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| FilterError::new(ErrorKind::Internal, format!("invalid header name `{key}`")))?;

        headers.remove(&name);
        for value in values {
            let value = HeaderValue::from_str(value).map_err(|_| {
                FilterError::new(ErrorKind::Internal, format!("invalid value for header `{key}`"))
            })?;
            headers.append(name.clone(), value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::RouteFilter;

    fn route(filter: RouteFilter) -> Route {
        Route::new("/uuid", "GET", "http://backend/uuid")
            .unwrap()
            .with_filter(filter)
    }

    #[test]
    fn test_set_request_header() {
        let route = route(
            RouteFilter::new(SetRequestHeader::NAME)
                .property("x-tenant", ["acme"])
                .property("accept", ["application/json", "text/plain"]),
        );
        let mut request = Request::builder()
            .header("x-tenant", "other")
            .body(Body::empty())
            .unwrap();

        SetRequestHeader
            .apply(&route, &mut request, &mut ProxyResponse::new())
            .unwrap();

        assert_eq!(request.headers()["x-tenant"], "acme");
        let accept: Vec<_> = request.headers().get_all("accept").iter().collect();
        assert_eq!(accept, vec!["application/json", "text/plain"]);
    }

    #[test]
    fn test_set_response_header() {
        let route = route(RouteFilter::new(SetResponseHeader::NAME).property("x-gateway", ["on"]));
        let mut response = ProxyResponse::new();

        SetResponseHeader
            .apply(&route, &mut Request::new(Body::empty()), &mut response)
            .unwrap();
        assert_eq!(response.headers()["x-gateway"], "on");
    }

    #[test]
    fn test_invalid_header_name_is_internal() {
        let route = route(RouteFilter::new(SetResponseHeader::NAME).property("bad header", ["x"]));
        let err = SetResponseHeader
            .apply(&route, &mut Request::new(Body::empty()), &mut ProxyResponse::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_require_header() {
        let route = route(RouteFilter::new(RequireHeader::NAME).property("header", ["authorization"]));

        let err = RequireHeader
            .apply(&route, &mut Request::new(Body::empty()), &mut ProxyResponse::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let mut request = Request::builder()
            .header("Authorization", "Bearer token")
            .body(Body::empty())
            .unwrap();
        assert!(RequireHeader
            .apply(&route, &mut request, &mut ProxyResponse::new())
            .is_ok());
    }

    #[test]
    fn test_without_properties_is_a_no_op() {
        let route = Route::new("/uuid", "GET", "http://backend/uuid").unwrap();
        let mut request = Request::new(Body::empty());
        let mut response = ProxyResponse::new();

        assert!(SetRequestHeader.apply(&route, &mut request, &mut response).is_ok());
        assert!(SetResponseHeader.apply(&route, &mut request, &mut response).is_ok());
        assert!(RequireHeader.apply(&route, &mut request, &mut response).is_ok());
        assert!(response.headers().is_empty());
    }
}
