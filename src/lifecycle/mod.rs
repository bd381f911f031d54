//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Logging → Load config → Write TLS material → Build server → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then TLS, then listener
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has a grace period: connections still open after it are closed

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
