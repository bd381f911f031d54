//! Command-line and environment surface.
//!
//! Every option can be given as a flag or through the environment variable
//! the platform sets (`PORT`, `CERTIFICATE`, `KEY`, ...). Values are kept as
//! raw strings where the loader applies its own parsing rules.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{
    LogFormat, DEFAULT_FORWARDED_URL_HEADER, DEFAULT_PORT, DEFAULT_PROXY_SIGNATURE_HEADER,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "route-service")]
#[command(about = "TLS-terminating route service that forwards to the destination named by the router", long_about = None)]
pub struct Cli {
    /// TCP port for the TLS listener.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Interface the listener binds to.
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    /// PEM-encoded TLS certificate. Literal `\n` sequences are unescaped.
    #[arg(long, env = "CERTIFICATE", hide_env_values = true, allow_hyphen_values = true)]
    pub certificate: Option<String>,

    /// PEM-encoded TLS private key. Literal `\n` sequences are unescaped.
    #[arg(long, env = "KEY", hide_env_values = true, allow_hyphen_values = true)]
    pub key: Option<String>,

    /// Directory the certificate and key are written to.
    #[arg(long, env = "TLS_DIR", default_value = ".")]
    pub tls_dir: PathBuf,

    /// Skip upstream certificate validation. Unset or unparsable means validate.
    #[arg(long, env = "SKIP_SSL_VALIDATION")]
    pub skip_ssl_validation: Option<String>,

    /// Milliseconds to pause before every upstream call.
    #[arg(long, env = "ROUTE_SERVICE_SLEEP_MILLI")]
    pub sleep_milli: Option<String>,

    /// Header carrying the destination URL.
    #[arg(long, env = "FORWARDED_URL_HEADER", default_value = DEFAULT_FORWARDED_URL_HEADER)]
    pub forwarded_url_header: String,

    /// Header carrying the router signature.
    #[arg(long, env = "PROXY_SIGNATURE_HEADER", default_value = DEFAULT_PROXY_SIGNATURE_HEADER)]
    pub proxy_signature_header: String,

    /// Deadline for the upstream call, in seconds.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Upstream connect timeout, in seconds.
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,

    /// Largest request body that will be buffered, in bytes.
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Seconds to drain in-flight requests on shutdown.
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 10)]
    pub shutdown_grace_secs: u64,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Address for the Prometheus scrape endpoint.
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}
