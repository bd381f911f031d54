//! Configuration loading from the command line and environment.

use std::time::Duration;

use crate::config::cli::Cli;
use crate::config::schema::{
    HeaderConfig, ListenerConfig, ObservabilityConfig, ServiceConfig, TlsMaterial, UpstreamConfig,
};
use crate::config::validation::{validate_config, ValidationError};
use crate::proxy::delay::{ArtificialDelay, DelayParseError};
use crate::proxy::trust::TrustPolicy;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TLS certificate needs to be provided as environment variable (CERTIFICATE)")]
    MissingCertificate,

    #[error("TLS key needs to be provided as environment variable (KEY)")]
    MissingKey,

    #[error("invalid ROUTE_SERVICE_SLEEP_MILLI: {0}")]
    Delay(#[from] DelayParseError),

    #[error("invalid METRICS_ADDRESS {value:?}: {source}")]
    MetricsAddress {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build and validate the service configuration from parsed arguments.
pub fn load_config(cli: Cli) -> Result<ServiceConfig, ConfigError> {
    let certificate = cli
        .certificate
        .filter(|c| !c.is_empty())
        .ok_or(ConfigError::MissingCertificate)?;
    let key = cli
        .key
        .filter(|k| !k.is_empty())
        .ok_or(ConfigError::MissingKey)?;

    let trust = trust_policy_from_flag(cli.skip_ssl_validation.as_deref());
    let delay = ArtificialDelay::parse(cli.sleep_milli.as_deref())?;

    let metrics_address = match cli.metrics_address.filter(|a| !a.is_empty()) {
        Some(value) => Some(
            value
                .parse()
                .map_err(|source| ConfigError::MetricsAddress { value, source })?,
        ),
        None => None,
    };

    let config = ServiceConfig {
        listener: ListenerConfig {
            bind_host: cli.bind_host,
            port: cli.port,
            tls: TlsMaterial {
                certificate: unescape_newlines(&certificate),
                key: unescape_newlines(&key),
                dir: cli.tls_dir,
            },
        },
        headers: HeaderConfig {
            forwarded_url: cli.forwarded_url_header,
            proxy_signature: cli.proxy_signature_header,
        },
        upstream: UpstreamConfig {
            trust,
            request_timeout: Duration::from_secs(cli.upstream_timeout_secs),
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
        },
        delay,
        max_body_bytes: cli.max_body_bytes,
        shutdown_grace: Duration::from_secs(cli.shutdown_grace_secs),
        observability: ObservabilityConfig {
            log_format: cli.log_format,
            metrics_address,
        },
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Platforms often flatten PEM blocks into one line with literal `\n`.
pub fn unescape_newlines(pem: &str) -> String {
    pem.replace("\\n", "\n")
}

/// Map the skip-validation flag onto a trust policy.
///
/// Only an explicit true value disables validation; anything unparsable
/// falls back to validating certificates.
pub fn trust_policy_from_flag(raw: Option<&str>) -> TrustPolicy {
    match raw.map(parse_bool) {
        Some(Some(true)) => TrustPolicy::SkipVerification,
        Some(Some(false)) | None => TrustPolicy::Verify,
        Some(None) => {
            tracing::warn!(
                value = raw.unwrap_or_default(),
                "SKIP_SSL_VALIDATION is not a boolean, validating upstream certificates"
            );
            TrustPolicy::Verify
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
