//! Metrics collection and exposition.
//!
//! # Metrics
//! - `route_service_requests_total` (counter): exchanges by method, status
//! - `route_service_request_duration_seconds` (histogram): end-to-end latency,
//!   including any artificial delay
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus exporter is only started when an address is configured

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "route_service_requests_total";
pub const REQUEST_DURATION: &str = "route_service_request_duration_seconds";

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished exchange.
pub fn record_exchange(method: &str, status: u16, started: Instant) {
    ::metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(REQUEST_DURATION, "method" => method.to_string())
        .record(started.elapsed().as_secs_f64());
}
