//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Director / transport produce:
//!     → exchange.rs (ExchangeEvent → ExchangeObserver)
//!         → TracingObserver → logging.rs subscriber (stdout, text or JSON)
//! HTTP server produces:
//!     → metrics.rs (counters, histograms)
//!     → tower-http TraceLayer spans
//! ```
//!
//! # Design Decisions
//! - Exchange reporting is injected so the core can be tested without
//!   capturing log output
//! - Exchange ID flows through every event and span

pub mod exchange;
pub mod logging;
pub mod metrics;

pub use exchange::{ExchangeEvent, ExchangeObserver, RecordingObserver, TracingObserver};
