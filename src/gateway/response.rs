//! Response under construction for a single request.
//!
//! Filters, the reverse proxy and error handlers all write into the same
//! [`ProxyResponse`]. Headers written by a filter are kept even if a later
//! step fails.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;

pub struct ProxyResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl ProxyResponse {
    /// Empty `200 OK`.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Writes a JSON body with the given status.
    pub fn json(&mut self, status: StatusCode, value: &serde_json::Value) {
        self.status = status;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Body::from(serde_json::to_vec(value).unwrap_or_default());
    }

    /// Takes over a backend response: its status and body replace the
    /// pending ones, its headers are appended after any filter-written ones.
    pub(crate) fn relay(&mut self, upstream: Response<Body>) {
        let (parts, body) = upstream.into_parts();
        self.status = parts.status;
        for (name, value) in parts.headers.iter() {
            self.headers.append(name.clone(), value.clone());
        }
        self.body = body;
    }
}

impl Default for ProxyResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> axum::response::Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
