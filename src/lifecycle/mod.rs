//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Register filters/handlers
//!     → validate_dependencies → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C or trigger() → Stop accepting → Drain connections → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then gateway state, then listener
//! - A missing default error handler aborts startup before binding

pub mod shutdown;

pub use shutdown::Shutdown;
