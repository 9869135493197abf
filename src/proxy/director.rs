//! Outbound request rewrite.
//!
//! # Responsibilities
//! - Point the request at the route target (scheme, authority, path, Host)
//! - Merge the target's query string with the inbound one
//! - Drop hop-by-hop headers and record `X-Forwarded-*`
//!
//! # Design Decisions
//! - Query strings are concatenated, target first; duplicate keys are kept
//!   side by side rather than resolved here
//! - Host, path and scheme depend only on the target URL, so rewriting an
//!   already-rewritten request is a no-op for them

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{self, HeaderName};
use axum::http::{HeaderValue, Request, Uri};
use url::Url;

use crate::gateway::GatewayError;

/// Headers that describe a single connection and must not be forwarded.
pub const HOP_BY_HOP_HEADERS: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Joins two raw query strings with `&`; an empty side is dropped.
pub fn merge_query(target: Option<&str>, inbound: Option<&str>) -> String {
    match (
        target.filter(|q| !q.is_empty()),
        inbound.filter(|q| !q.is_empty()),
    ) {
        (Some(target), Some(inbound)) => format!("{target}&{inbound}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => String::new(),
    }
}

/// `host[:port]` of the target as it should appear in `Host`.
pub fn target_authority(target: &Url) -> Option<String> {
    let host = target.host_str().filter(|host| !host.is_empty())?;
    Some(match target.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Rewrites `request` in place so that it targets `target`.
pub fn direct(target: &Url, request: &mut Request<Body>) -> Result<(), GatewayError> {
    let authority = target_authority(target).ok_or_else(|| GatewayError::InvalidTarget {
        target: target.to_string(),
        source: url::ParseError::EmptyHost,
    })?;

    let query = merge_query(target.query(), request.uri().query());
    let path_and_query = if query.is_empty() {
        target.path().to_string()
    } else {
        format!("{}?{}", target.path(), query)
    };

    let uri = Uri::builder()
        .scheme(target.scheme())
        .authority(authority.as_str())
        .path_and_query(path_and_query)
        .build()?;
    let host = HeaderValue::from_str(&authority).map_err(axum::http::Error::from)?;

    *request.uri_mut() = uri;
    request.headers_mut().insert(header::HOST, host);
    Ok(())
}

/// Removes hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(request: &mut Request<Body>) {
    let headers = request.headers_mut();

    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP_HEADERS.iter()) {
        headers.remove(name);
    }
}

/// Records the caller in `X-Forwarded-For/Host/Proto`.
///
/// Must run before [`direct`], which overwrites `Host`.
pub fn set_forwarded_headers(request: &mut Request<Body>) {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let original_host = request.headers().get(header::HOST).cloned();
    let headers = request.headers_mut();

    if let Some(ip) = client_ip {
        let forwarded_for = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) => format!("{prior}, {ip}"),
            None => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    if let Some(host) = original_host {
        headers.insert(X_FORWARDED_HOST, host);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
}
