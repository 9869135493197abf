//! HTTP adapter subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace, timeout layers)
//!     → routing (method + path → RouteMatch)
//!     → Route::enrich (path parameters into path and target)
//!     → GatewayState::process (filters → forward | error handler)
//!     → Send to client
//! ```

pub mod request_id;
pub mod server;

pub use request_id::{UuidRequestId, X_REQUEST_ID};
pub use server::GatewayServer;
