//! Route service library.
//!
//! Forwards each request to the URL the platform router put in
//! `X-Cf-Forwarded-Url`, relays the backend's answer verbatim and reports
//! the full exchange.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
