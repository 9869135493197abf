//! Backend response sanitizing.
//!
//! The gateway owns the CORS policy seen by callers, so CORS headers coming
//! back from a backend are removed before the response is relayed.

use axum::http::header::{self, HeaderName, InvalidHeaderName};
use axum::http::HeaderMap;

use crate::proxy::director::HOP_BY_HOP_HEADERS;

/// Headers removed from every backend response unless configured otherwise.
pub const DEFAULT_STRIPPED_HEADERS: [HeaderName; 6] = [
    header::ACCESS_CONTROL_ALLOW_ORIGIN,
    header::ACCESS_CONTROL_ALLOW_METHODS,
    header::ACCESS_CONTROL_ALLOW_HEADERS,
    header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
    header::ACCESS_CONTROL_MAX_AGE,
    header::ACCESS_CONTROL_EXPOSE_HEADERS,
];

#[derive(Debug, Clone)]
pub struct ResponseModifier {
    strip: Vec<HeaderName>,
}

impl ResponseModifier {
    /// Builds a modifier from header names (case-insensitive).
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, InvalidHeaderName> {
        let strip = names
            .iter()
            .map(|name| HeaderName::from_bytes(name.as_ref().as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { strip })
    }

    pub fn stripped(&self) -> &[HeaderName] {
        &self.strip
    }

    /// Removes the configured headers and hop-by-hop headers.
    pub fn apply(&self, headers: &mut HeaderMap) {
        // Framing is recomputed by the server for the relayed body.
        for name in self.strip.iter().chain(HOP_BY_HOP_HEADERS.iter()) {
            headers.remove(name);
        }
    }
}

impl Default for ResponseModifier {
    fn default() -> Self {
        Self {
            strip: DEFAULT_STRIPPED_HEADERS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn cors_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        for name in DEFAULT_STRIPPED_HEADERS {
            headers.insert(name, HeaderValue::from_static("*"));
        }
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers
    }

    #[test]
    fn test_default_strips_all_cors_headers() {
        let mut headers = cors_headers();
        ResponseModifier::default().apply(&mut headers);

        for name in DEFAULT_STRIPPED_HEADERS {
            assert!(headers.get(&name).is_none(), "{name} should be stripped");
        }
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_configured_set_is_respected() {
        let modifier = ResponseModifier::from_names(&[
            "Access-Control-Allow-Origin",
            "Access-Control-Allow-Methods",
            "Access-Control-Allow-Headers",
            "Access-Control-Allow-Credentials",
        ])
        .unwrap();

        let mut headers = cors_headers();
        modifier.apply(&mut headers);

        assert!(headers.get("access-control-allow-origin").is_none());
        assert!(headers.get("access-control-allow-credentials").is_none());
        assert_eq!(headers["access-control-max-age"], "*");
        assert_eq!(headers["access-control-expose-headers"], "*");
    }

    #[test]
    fn test_invalid_name_rejected() {
        assert!(ResponseModifier::from_names(&["bad header"]).is_err());
    }
}
