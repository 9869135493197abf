//! Reverse-proxy subsystem.
//!
//! # Data Flow
//! ```text
//! enriched Route + inbound Request
//!     → director.rs (target scheme/host/path, merged query, Host header)
//!     → hyper-util client (HTTP/1.1, HTTP/2, TLS via rustls)
//!     → modifier.rs (strip backend CORS + hop-by-hop headers)
//!     → ProxyResponse (status, headers, streamed body)
//! ```
//!
//! # Design Decisions
//! - The target is parsed per request; a bad target fails before any
//!   network I/O and surfaces as an error for the dispatcher
//! - Bodies are streamed in both directions, never buffered
//! - Timeouts belong to the transport (connect) and to the server (request)

pub mod director;
pub mod modifier;

use std::sync::Once;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::{ProxyConfig, TimeoutConfig};
use crate::gateway::{GatewayError, ProxyResponse, Route, StartupError};

pub use director::merge_query;
pub use modifier::{ResponseModifier, DEFAULT_STRIPPED_HEADERS};

type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Forwards requests to route targets.
#[derive(Clone)]
pub struct ReverseProxy {
    client: UpstreamClient,
    modifier: ResponseModifier,
    forwarded_headers: bool,
}

impl ReverseProxy {
    /// Builds the proxy from configuration.
    pub fn new(proxy: &ProxyConfig, timeouts: &TimeoutConfig) -> Result<Self, StartupError> {
        let modifier = ResponseModifier::from_names(&proxy.strip_response_headers)?;
        Ok(Self {
            client: build_client(timeouts),
            modifier,
            forwarded_headers: proxy.forwarded_headers,
        })
    }

    pub fn modifier(&self) -> &ResponseModifier {
        &self.modifier
    }

    /// Rewrites `request` for the route target, sends it and relays the
    /// backend response into `response`.
    ///
    /// The request body is moved into the outbound call; the rest of the
    /// request stays readable for an error handler if forwarding fails.
    pub async fn forward(
        &self,
        route: &Route,
        request: &mut Request<Body>,
        response: &mut ProxyResponse,
    ) -> Result<(), GatewayError> {
        let target = route.target_url()?;

        director::strip_hop_by_hop(request);
        if self.forwarded_headers {
            director::set_forwarded_headers(request);
        }
        director::direct(&target, request)?;

        let mut outbound = Request::builder()
            .method(request.method().clone())
            .uri(request.uri().clone())
            .body(std::mem::take(request.body_mut()))?;
        *outbound.headers_mut() = request.headers().clone();

        tracing::debug!(
            method = %outbound.method(),
            uri = %outbound.uri(),
            "Forwarding request"
        );

        let upstream = self.client.request(outbound).await?;
        response.relay(self.relayable(upstream));
        Ok(())
    }

    fn relayable(&self, upstream: Response<Incoming>) -> Response<Body> {
        let (mut parts, body) = upstream.into_parts();
        self.modifier.apply(&mut parts.headers);
        Response::from_parts(parts, Body::new(body))
    }
}

fn build_client(timeouts: &TimeoutConfig) -> UpstreamClient {
    install_crypto_provider();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);
    http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
        .build(https)
}

/// rustls needs a process-level crypto provider before the first TLS config.
fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        // Already installed by the embedding application is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
