//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection (axum-server)
//!     → server.rs (Axum setup, tracing, panic isolation, exchange span)
//!     → proxy::Director → proxy::ForwardingTransport
//!     → response.rs (errors → status codes)
//!     → Send to router
//! ```

pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
