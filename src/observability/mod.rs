//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → logging.rs (subscriber: env filter + fmt layer)
//!
//! HTTP layer adds:
//!     → TraceLayer spans per request
//!     → x-request-id (UUID v4) on request, response and backend call
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Request ID flows through all subsystems

pub mod logging;
