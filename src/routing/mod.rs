//! Routing subsystem (router adapter side).
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route table lookup, declaration order)
//!     → matcher.rs (segment template match, extract :params)
//!     → Return: RouteMatch { route, params } or no match
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Route::new (validate method + target)
//!     → PathTemplate::new (split into segments)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; reload builds a new one and swaps it in
//! - No regex in hot path (segment comparison only)
//! - First match wins (ordered by declaration)

pub mod matcher;
pub mod router;

pub use matcher::{ParamExtractor, PathTemplate};
pub use router::{RouteMatch, RouteTable};
