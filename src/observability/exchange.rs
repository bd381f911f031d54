//! Exchange observers.
//!
//! The director and transport report what they see through an
//! [`ExchangeObserver`] instead of logging directly. [`TracingObserver`] is
//! what the service runs with; [`RecordingObserver`] keeps events in memory
//! for inspection.

use std::sync::Mutex;
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use uuid::Uuid;

/// Something that happened while handling one exchange.
#[derive(Debug, Clone)]
pub enum ExchangeEvent {
    /// Inbound request fully buffered.
    RequestReceived {
        exchange_id: Uuid,
        skip_tls_validation: bool,
        method: Method,
        destination: Option<String>,
        signature: Option<String>,
        headers: HeaderMap,
        body: Bytes,
    },
    /// Artificial delay about to start.
    Delaying { exchange_id: Uuid, duration: Duration },
    /// Upstream call about to be dispatched.
    Forwarding { exchange_id: Uuid, url: String },
    /// Upstream response fully buffered.
    ResponseReceived {
        exchange_id: Uuid,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// Response handed back to the router.
    Relaying { exchange_id: Uuid, status: StatusCode },
    /// The exchange ended with an error response.
    Failed {
        exchange_id: Uuid,
        status: StatusCode,
        error: String,
    },
}

impl ExchangeEvent {
    pub fn exchange_id(&self) -> Uuid {
        match self {
            ExchangeEvent::RequestReceived { exchange_id, .. }
            | ExchangeEvent::Delaying { exchange_id, .. }
            | ExchangeEvent::Forwarding { exchange_id, .. }
            | ExchangeEvent::ResponseReceived { exchange_id, .. }
            | ExchangeEvent::Relaying { exchange_id, .. }
            | ExchangeEvent::Failed { exchange_id, .. } => *exchange_id,
        }
    }
}

/// Sink for exchange events.
pub trait ExchangeObserver: Send + Sync + 'static {
    fn observe(&self, event: &ExchangeEvent);
}

/// Emits every event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExchangeObserver for TracingObserver {
    fn observe(&self, event: &ExchangeEvent) {
        match event {
            ExchangeEvent::RequestReceived {
                exchange_id,
                skip_tls_validation,
                method,
                destination,
                signature,
                headers,
                body,
            } => {
                tracing::info!(
                    exchange_id = %exchange_id,
                    skip_ssl_validation = skip_tls_validation,
                    method = %method,
                    forwarded_url = destination.as_deref().unwrap_or_default(),
                    proxy_signature = signature.as_deref().unwrap_or_default(),
                    headers = ?headers,
                    body = %String::from_utf8_lossy(body),
                    "Received request"
                );
            }
            ExchangeEvent::Delaying { exchange_id, duration } => {
                tracing::info!(
                    exchange_id = %exchange_id,
                    millis = duration.as_millis() as u64,
                    "Sleeping before forwarding"
                );
            }
            ExchangeEvent::Forwarding { exchange_id, url } => {
                tracing::info!(exchange_id = %exchange_id, url = %url, "Forwarding");
            }
            ExchangeEvent::ResponseReceived {
                exchange_id,
                status,
                headers,
                body,
            } => {
                tracing::info!(
                    exchange_id = %exchange_id,
                    status = status.as_u16(),
                    headers = ?headers,
                    body = %String::from_utf8_lossy(body),
                    "Received response"
                );
            }
            ExchangeEvent::Relaying { exchange_id, status } => {
                tracing::info!(
                    exchange_id = %exchange_id,
                    status = status.as_u16(),
                    "Sending response to router"
                );
            }
            ExchangeEvent::Failed {
                exchange_id,
                status,
                error,
            } => {
                if status.is_server_error() {
                    tracing::error!(exchange_id = %exchange_id, status = status.as_u16(), error = %error, "Exchange failed");
                } else {
                    tracing::warn!(exchange_id = %exchange_id, status = status.as_u16(), error = %error, "Exchange rejected");
                }
            }
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ExchangeEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<ExchangeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events belonging to one exchange.
    pub fn for_exchange(&self, exchange_id: Uuid) -> Vec<ExchangeEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.exchange_id() == exchange_id)
            .collect()
    }
}

impl ExchangeObserver for RecordingObserver {
    fn observe(&self, event: &ExchangeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
