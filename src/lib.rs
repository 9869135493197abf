//! Filter-chain API gateway library.

pub mod config;
pub mod filters;
pub mod gateway;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::GatewayConfig;
pub use gateway::{GatewayState, Route};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
