//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Write TLS material and build the listener configuration
//! - Build the director and transport, start the metrics exporter
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use crate::config::{load_config, Cli, ConfigError};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::tls::{load_tls_config, write_tls_material, TlsError};
use crate::observability::{logging, metrics};

/// Anything that stops the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("failed to build upstream TLS client: {0}")]
    UpstreamTls(#[from] rustls::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the route service and run it until a termination signal.
pub async fn run(cli: Cli) -> Result<(), StartupError> {
    logging::init_logging(cli.log_format)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "route-service starting");

    let config = load_config(cli)?;

    tracing::info!(
        port = config.listener.port,
        skip_ssl_validation = config.upstream.trust.skips_validation(),
        sleep_millis = config.delay.duration().map(|d| d.as_millis() as u64),
        upstream_timeout = ?config.upstream.request_timeout,
        forwarded_url_header = %config.headers.forwarded_url,
        "Configuration loaded"
    );

    let (cert_path, key_path) = write_tls_material(&config.listener.tls)?;
    let tls = load_tls_config(&cert_path, &key_path)?;

    if let Some(addr) = config.observability.metrics_address {
        metrics::init_metrics(addr)?;
    }

    let addr = config
        .listener
        .socket_addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let server = HttpServer::new(config)?;

    let listener = std::net::TcpListener::bind(addr)?;
    tracing::info!(address = %addr, "Listening for TLS connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, tls, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
