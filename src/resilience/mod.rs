//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce per-request deadline)
//!     → On failure: error surfaced to the caller, never retried
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries: the router owns retry decisions for route services

pub mod timeouts;
