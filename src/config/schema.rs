//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the route
//! service. Values are produced once at startup by [`crate::config::loader`]
//! and never change afterwards.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::proxy::delay::ArtificialDelay;
use crate::proxy::trust::TrustPolicy;

/// Default TLS listener port.
pub const DEFAULT_PORT: u16 = 8080;

/// Header carrying the percent-encoded destination URL.
pub const DEFAULT_FORWARDED_URL_HEADER: &str = "X-Cf-Forwarded-Url";

/// Header carrying the router's signature.
pub const DEFAULT_PROXY_SIGNATURE_HEADER: &str = "X-Cf-Proxy-Signature";

/// Root configuration for the route service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, TLS material).
    pub listener: ListenerConfig,

    /// Route-service header names.
    pub headers: HeaderConfig,

    /// Upstream call configuration.
    pub upstream: UpstreamConfig,

    /// Pause inserted before every upstream call.
    pub delay: ArtificialDelay,

    /// Maximum inbound body size that will be buffered, in bytes.
    pub max_body_bytes: usize,

    /// Grace period for draining connections on shutdown.
    pub shutdown_grace: Duration,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            headers: HeaderConfig::default(),
            upstream: UpstreamConfig::default(),
            delay: ArtificialDelay::none(),
            max_body_bytes: 10 * 1024 * 1024,
            shutdown_grace: Duration::from_secs(10),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// TCP port for the TLS listener.
    pub port: u16,

    /// TLS certificate/key material.
    pub tls: TlsMaterial,
}

impl ListenerConfig {
    /// Resolve `bind_host:port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_host, self.port).parse()
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tls: TlsMaterial::default(),
        }
    }
}

/// PEM material for the listener and where it gets written.
#[derive(Clone, Default)]
pub struct TlsMaterial {
    /// PEM-encoded certificate chain.
    pub certificate: String,

    /// PEM-encoded private key.
    pub key: String,

    /// Directory receiving `server.crt` and `server.key`.
    pub dir: PathBuf,
}

impl TlsMaterial {
    pub fn cert_path(&self) -> PathBuf {
        self.dir.join("server.crt")
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join("server.key")
    }
}

// Key material never reaches the logs.
impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("certificate_bytes", &self.certificate.len())
            .field("key", &"<redacted>")
            .field("dir", &self.dir)
            .finish()
    }
}

/// Names of the headers the platform router attaches.
#[derive(Debug, Clone)]
pub struct HeaderConfig {
    /// Header carrying the destination URL.
    pub forwarded_url: String,

    /// Header carrying the router signature.
    pub proxy_signature: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            forwarded_url: DEFAULT_FORWARDED_URL_HEADER.to_string(),
            proxy_signature: DEFAULT_PROXY_SIGNATURE_HEADER.to_string(),
        }
    }
}

/// Upstream call configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Certificate trust policy for upstream TLS.
    pub trust: TrustPolicy,

    /// Deadline covering the upstream call and the response body read.
    pub request_timeout: Duration,

    /// Connection establishment timeout.
    pub connect_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            trust: TrustPolicy::Verify,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus scrape address, disabled when unset.
    pub metrics_address: Option<SocketAddr>,
}
