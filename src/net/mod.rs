//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! CERTIFICATE / KEY (environment)
//!     → tls.rs (write server.crt / server.key, build rustls ServerConfig)
//!     → axum-server TLS listener (HTTP/1.1 and HTTP/2 via ALPN)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - The listener only speaks TLS; there is no plaintext fallback
//! - Bad TLS material is a startup error, never a per-request one

pub mod tls;
