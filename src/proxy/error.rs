//! Per-request failures.
//!
//! Every variant is scoped to the exchange that produced it and maps onto a
//! status code for the caller. None of them stop the process.

use std::error::Error as StdError;
use std::time::Duration;

use axum::http::StatusCode;

use crate::proxy::destination::DestinationError;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Destination(#[from] DestinationError),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    #[error("destination cannot be used as a request target: {0}")]
    InvalidTarget(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),

    #[error("failed to read upstream response body: {0}")]
    ResponseBody(#[source] hyper::Error),

    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Destination(_)
            | ProxyError::RequestBody(_)
            | ProxyError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream(_) | ProxyError::ResponseBody(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// True when the upstream TLS handshake failed because its certificate
    /// was rejected.
    pub fn is_certificate_rejection(&self) -> bool {
        let mut current: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(err) = current {
            if is_invalid_certificate(err) {
                return true;
            }
            if let Some(io) = err.downcast_ref::<std::io::Error>() {
                if io.get_ref().is_some_and(|inner| is_invalid_certificate(inner)) {
                    return true;
                }
            }
            current = err.source();
        }
        false
    }

    /// Full cause chain, `outer: inner: ...`.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut current = self.source();
        while let Some(err) = current {
            rendered.push_str(": ");
            rendered.push_str(&err.to_string());
            current = err.source();
        }
        rendered
    }
}

fn is_invalid_certificate(err: &(dyn StdError + 'static)) -> bool {
    matches!(
        err.downcast_ref::<rustls::Error>(),
        Some(rustls::Error::InvalidCertificate(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(
            ProxyError::Destination(DestinationError::Missing("X-Cf-Forwarded-Url".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::BodyTooLarge { limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ProxyError::UpstreamTimeout(Duration::from_secs(1)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ProxyError::InvalidTarget("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn chain_includes_sources() {
        let err = ProxyError::Destination(DestinationError::NoHost("http://".into()));
        assert_eq!(err.chain(), err.to_string());
        assert!(!err.is_certificate_rejection());
    }
}
