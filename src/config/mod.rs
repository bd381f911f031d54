//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! flags / environment (PORT, CERTIFICATE, KEY, SKIP_SSL_VALIDATION, ...)
//!     → cli.rs (clap parse, env fallbacks)
//!     → loader.rs (convert raw values, apply defaults)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc to the director and transport
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; nothing re-reads the environment later
//! - Missing TLS material is fatal, a bad trust flag falls back to validating
//! - Validation separates syntactic (clap) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, ConfigError};
pub use schema::{
    HeaderConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig, TlsMaterial,
    UpstreamConfig,
};
