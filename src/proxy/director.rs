//! Request director.
//!
//! # Responsibilities
//! - Read the destination and signature headers
//! - Buffer the inbound body and report it without consuming it
//! - Apply the artificial delay before anything is dispatched
//! - Rewrite the request target and `Host` header to the destination
//!
//! # Design Decisions
//! - A bad destination fails this request only (400), never the process
//! - End-to-end headers pass through untouched; only hop-by-hop headers
//!   tied to the inbound connection are dropped
//! - The outbound leg always speaks HTTP/1.1

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Request, Version};
use bytes::Bytes;
use http_body_util::Full;
use uuid::Uuid;

use crate::config::{HeaderConfig, ServiceConfig};
use crate::observability::exchange::{ExchangeEvent, ExchangeObserver};
use crate::proxy::delay::ArtificialDelay;
use crate::proxy::destination::{Destination, DestinationError};
use crate::proxy::error::ProxyError;
use crate::proxy::trust::TrustPolicy;

/// Headers scoped to a single connection (RFC 9110 §7.6.1).
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

/// Request as it will be sent upstream.
pub type OutboundRequest = Request<Full<Bytes>>;

/// Turns inbound requests into outbound requests.
pub struct Director {
    forwarded_url: HeaderName,
    proxy_signature: HeaderName,
    delay: ArtificialDelay,
    trust: TrustPolicy,
    max_body_bytes: usize,
    observer: Arc<dyn ExchangeObserver>,
}

impl Director {
    pub fn new(config: &ServiceConfig, observer: Arc<dyn ExchangeObserver>) -> Self {
        let HeaderConfig {
            forwarded_url,
            proxy_signature,
        } = &config.headers;

        Self {
            forwarded_url: header_name(forwarded_url, "x-cf-forwarded-url"),
            proxy_signature: header_name(proxy_signature, "x-cf-proxy-signature"),
            delay: config.delay,
            trust: config.upstream.trust,
            max_body_bytes: config.max_body_bytes,
            observer,
        }
    }

    /// Rewrite `request` into the request that must go upstream.
    pub async fn direct(
        &self,
        exchange_id: Uuid,
        request: Request<Body>,
    ) -> Result<OutboundRequest, ProxyError> {
        let (mut parts, body) = request.into_parts();

        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| self.body_error(e))?;

        let forwarded = parts.headers.get(&self.forwarded_url).cloned();
        self.observer.observe(&ExchangeEvent::RequestReceived {
            exchange_id,
            skip_tls_validation: self.trust.skips_validation(),
            method: parts.method.clone(),
            destination: forwarded
                .as_ref()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()),
            signature: parts
                .headers
                .get(&self.proxy_signature)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()),
            headers: parts.headers.clone(),
            body: body.clone(),
        });

        let destination = match forwarded {
            Some(value) => Destination::parse(&value)?,
            None => {
                return Err(DestinationError::Missing(self.forwarded_url.to_string()).into());
            }
        };

        if let Some(duration) = self.delay.duration() {
            self.observer.observe(&ExchangeEvent::Delaying {
                exchange_id,
                duration,
            });
            self.delay.pause().await;
        }

        parts.uri = destination.uri().clone();
        let host = destination
            .host_header()
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))?;
        parts.headers.insert(header::HOST, host);
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);

        Ok(Request::from_parts(parts, Full::new(body)))
    }

    fn body_error(&self, err: axum::Error) -> ProxyError {
        let too_large = std::error::Error::source(&err)
            .is_some_and(|inner| inner.is::<http_body_util::LengthLimitError>());
        if too_large {
            ProxyError::BodyTooLarge {
                limit: self.max_body_bytes,
            }
        } else {
            ProxyError::RequestBody(err)
        }
    }
}

fn header_name(name: &str, fallback: &'static str) -> HeaderName {
    // Names are checked by config validation; fall back to the platform default.
    HeaderName::from_bytes(name.as_bytes()).unwrap_or_else(|_| HeaderName::from_static(fallback))
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::exchange::RecordingObserver;
    use axum::http::Method;
    use http_body_util::BodyExt;
    use std::time::{Duration, Instant};

    fn director(config: ServiceConfig) -> (Director, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        (Director::new(&config, observer.clone()), observer)
    }

    fn inbound(destination: Option<&str>, body: &'static str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/ignored/by/the/director")
            .header(header::HOST, "route-service.apps.internal")
            .header("x-cf-proxy-signature", "sig-123")
            .header("x-custom", "kept");
        if let Some(destination) = destination {
            builder = builder.header("x-cf-forwarded-url", destination);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn rewrites_target_and_host() {
        let (director, _) = director(ServiceConfig::default());
        let outbound = director
            .direct(Uuid::new_v4(), inbound(Some("https://backend:9443/a/b?c=d"), "payload"))
            .await
            .unwrap();

        assert_eq!(outbound.method(), Method::POST);
        assert_eq!(outbound.uri(), "https://backend:9443/a/b?c=d");
        assert_eq!(outbound.headers()[header::HOST], "backend:9443");
        assert_eq!(outbound.headers()["x-custom"], "kept");
        assert_eq!(outbound.headers()["x-cf-proxy-signature"], "sig-123");
        assert_eq!(outbound.version(), Version::HTTP_11);

        let body = outbound.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn reports_request_without_consuming_body() {
        let (director, observer) = director(ServiceConfig::default());
        let id = Uuid::new_v4();
        let outbound = director
            .direct(id, inbound(Some("http://backend/"), "hello"))
            .await
            .unwrap();

        let events = observer.for_exchange(id);
        match &events[0] {
            ExchangeEvent::RequestReceived {
                destination,
                signature,
                body,
                skip_tls_validation,
                ..
            } => {
                assert_eq!(destination.as_deref(), Some("http://backend/"));
                assert_eq!(signature.as_deref(), Some("sig-123"));
                assert_eq!(body, &Bytes::from_static(b"hello"));
                assert!(!skip_tls_validation);
            }
            other => panic!("unexpected event {other:?}"),
        }

        let body = outbound.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn missing_destination_is_a_request_error() {
        let (director, observer) = director(ServiceConfig::default());
        let err = director
            .direct(Uuid::new_v4(), inbound(None, ""))
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::Destination(DestinationError::Missing(_))));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(observer.events().len(), 1);
    }

    #[tokio::test]
    async fn unparsable_destination_is_a_request_error() {
        let (director, _) = director(ServiceConfig::default());
        let err = director
            .direct(Uuid::new_v4(), inbound(Some("::not a url::"), ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Destination(DestinationError::Unparsable { .. })));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let config = ServiceConfig {
            max_body_bytes: 4,
            ..Default::default()
        };
        let (director, _) = director(config);
        let err = director
            .direct(Uuid::new_v4(), inbound(Some("http://backend/"), "too long"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::BodyTooLarge { limit: 4 }));
    }

    #[tokio::test]
    async fn applies_delay_before_returning() {
        let config = ServiceConfig {
            delay: ArtificialDelay::from_millis(80),
            ..Default::default()
        };
        let (director, observer) = director(config);
        let id = Uuid::new_v4();

        let start = Instant::now();
        director
            .direct(id, inbound(Some("http://backend/"), ""))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(80));
        assert!(observer
            .for_exchange(id)
            .iter()
            .any(|e| matches!(e, ExchangeEvent::Delaying { duration, .. } if *duration == Duration::from_millis(80))));
    }

    #[tokio::test]
    async fn uses_configured_header_names() {
        let mut config = ServiceConfig::default();
        config.headers.forwarded_url = "X-Destination".into();
        let (director, _) = director(config);

        let request = Request::builder()
            .uri("/")
            .header("x-destination", "http://elsewhere:8000/x")
            .body(Body::empty())
            .unwrap();
        let outbound = director.direct(Uuid::new_v4(), request).await.unwrap();
        assert_eq!(outbound.uri(), "http://elsewhere:8000/x");
    }

    #[tokio::test]
    async fn invalid_header_names_fall_back_per_header() {
        let mut config = ServiceConfig::default();
        config.headers.forwarded_url = "bad header".into();
        config.headers.proxy_signature = "also bad".into();
        let (director, observer) = director(config);
        let id = Uuid::new_v4();

        director
            .direct(id, inbound(Some("http://backend/"), ""))
            .await
            .unwrap();

        match &observer.for_exchange(id)[0] {
            ExchangeEvent::RequestReceived {
                destination,
                signature,
                ..
            } => {
                assert_eq!(destination.as_deref(), Some("http://backend/"));
                assert_eq!(signature.as_deref(), Some("sig-123"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn keeps_raw_target_and_written_port() {
        let (director, _) = director(ServiceConfig::default());
        let outbound = director
            .direct(
                Uuid::new_v4(),
                inbound(Some("https://example.com:443/a/../%2e%2e/b?q='v'"), ""),
            )
            .await
            .unwrap();

        assert_eq!(outbound.uri().path(), "/a/../%2e%2e/b");
        assert_eq!(outbound.uri().query(), Some("q='v'"));
        assert_eq!(outbound.headers()[header::HOST], "example.com:443");
    }

    #[test]
    fn strips_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, "keep-alive, x-session-hop".parse().unwrap());
        headers.insert("keep-alive", "timeout=5".parse().unwrap());
        headers.insert("x-session-hop", "1".parse().unwrap());
        headers.insert(header::UPGRADE, "h2c".parse().unwrap());
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    }
}
