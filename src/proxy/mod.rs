//! Route-service core.
//!
//! # Data Flow
//! ```text
//! Inbound request (X-Cf-Forwarded-Url, X-Cf-Proxy-Signature, body)
//!     → director.rs (buffer + report, delay.rs, destination.rs, rewrite)
//!     → transport.rs (trust.rs policy, upstream call, buffer + report)
//!     → Response relayed with identical status, headers, body
//! ```
//!
//! # Design Decisions
//! - All buffers are request-scoped; nothing is shared between exchanges
//! - Failures are per-request errors (error.rs), never process exits
//! - Reporting goes through an injected observer, not direct logging

pub mod delay;
pub mod destination;
pub mod director;
pub mod error;
pub mod transport;
pub mod trust;

pub use delay::ArtificialDelay;
pub use destination::Destination;
pub use director::Director;
pub use error::ProxyError;
pub use transport::ForwardingTransport;
pub use trust::TrustPolicy;
