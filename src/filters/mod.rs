//! Built-in filters.
//!
//! Every filter reads its route-scoped settings from the properties of the
//! route's filter reference with the same name.
//!
//! | name                  | properties                          | fails with        |
//! |-----------------------|-------------------------------------|-------------------|
//! | `set-request-header`  | `<header> = [values]`               | `Internal`        |
//! | `set-response-header` | `<header> = [values]`               | `Internal`        |
//! | `require-header`      | `header = [names]`                  | `Unauthorized`    |
//! | `rate-limit`          | `requests_per_second`, `burst`      | `TooManyRequests` |

pub mod headers;
pub mod rate_limit;

use std::sync::Arc;

use crate::gateway::GatewayState;

pub use headers::{RequireHeader, SetRequestHeader, SetResponseHeader};
pub use rate_limit::RateLimit;

/// Registers every built-in filter on `state`.
pub fn register_builtin(state: &GatewayState) {
    state.register_filter(Arc::new(SetRequestHeader));
    state.register_filter(Arc::new(SetResponseHeader));
    state.register_filter(Arc::new(RequireHeader));
    state.register_filter(Arc::new(RateLimit::new()));
}
