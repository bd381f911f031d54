//! Instrumented upstream call.
//!
//! Sends the directed request, buffers the upstream body so it can be
//! reported, and hands back a response with the same status and headers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Response;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use uuid::Uuid;

use crate::config::UpstreamConfig;
use crate::observability::exchange::{ExchangeEvent, ExchangeObserver};
use crate::proxy::director::OutboundRequest;
use crate::proxy::error::ProxyError;
use crate::resilience::timeouts::with_deadline;

type UpstreamClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Upstream HTTP client with a fixed trust policy.
pub struct ForwardingTransport {
    client: UpstreamClient,
    request_timeout: Duration,
    observer: Arc<dyn ExchangeObserver>,
}

impl ForwardingTransport {
    pub fn new(
        config: &UpstreamConfig,
        observer: Arc<dyn ExchangeObserver>,
    ) -> Result<Self, rustls::Error> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(config.connect_timeout));

        if config.trust.skips_validation() {
            tracing::warn!(
                "Upstream TLS certificate validation is DISABLED; any certificate will be accepted"
            );
        }

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(config.trust.client_config()?)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            client,
            request_timeout: config.request_timeout,
            observer,
        })
    }

    /// Perform the upstream call and relay its response.
    ///
    /// The deadline covers both the call and reading the response body.
    pub async fn round_trip(
        &self,
        exchange_id: Uuid,
        request: OutboundRequest,
    ) -> Result<Response<Body>, ProxyError> {
        self.observer.observe(&ExchangeEvent::Forwarding {
            exchange_id,
            url: request.uri().to_string(),
        });

        let (parts, body) = with_deadline(self.request_timeout, async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(ProxyError::Upstream)?;
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(ProxyError::ResponseBody)?
                .to_bytes();
            Ok((parts, body))
        })
        .await?;

        self.observer.observe(&ExchangeEvent::ResponseReceived {
            exchange_id,
            status: parts.status,
            headers: parts.headers.clone(),
            body: body.clone(),
        });
        self.observer.observe(&ExchangeEvent::Relaying {
            exchange_id,
            status: parts.status,
        });

        Ok(Response::from_parts(parts, Body::from(body)))
    }
}
