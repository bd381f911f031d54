//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the route-service handler
//! - Wire up middleware (tracing, panic isolation)
//! - Serve over TLS with graceful shutdown
//! - Run every exchange through the director and transport
//! - Observability (metrics, exchange IDs)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::observability::exchange::{ExchangeEvent, ExchangeObserver, TracingObserver};
use crate::observability::metrics;
use crate::proxy::{Director, ForwardingTransport, ProxyError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub director: Arc<Director>,
    pub transport: Arc<ForwardingTransport>,
    pub observer: Arc<dyn ExchangeObserver>,
}

/// HTTPS server for the route service.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
}

impl HttpServer {
    /// Create a server that reports exchanges through `tracing`.
    pub fn new(config: ServiceConfig) -> Result<Self, rustls::Error> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Create a server that reports exchanges to `observer`.
    pub fn with_observer(
        config: ServiceConfig,
        observer: Arc<dyn ExchangeObserver>,
    ) -> Result<Self, rustls::Error> {
        let director = Arc::new(Director::new(&config, observer.clone()));
        let transport = Arc::new(ForwardingTransport::new(&config.upstream, observer.clone())?);

        let state = AppState {
            director,
            transport,
            observer,
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config: Arc::new(config),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(route_service_handler))
            .route("/", any(route_service_handler))
            .with_state(state)
            .layer(CatchPanicLayer::new())
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for serving or for driving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server over TLS on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: std::net::TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTPS server starting"
        );

        let handle = Handle::new();
        let drain = handle.clone();
        let grace = self.config.shutdown_grace;
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!(grace = ?grace, "Draining connections");
            drain.graceful_shutdown(Some(grace));
        });

        axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Route-service handler.
/// Directs the request to its destination and relays the answer.
async fn route_service_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let started = Instant::now();
    let exchange_id = Uuid::new_v4();
    let method = request.method().to_string();
    let span = tracing::info_span!("exchange", id = %exchange_id, method = %method);

    let response = match forward(&state, exchange_id, request).instrument(span).await {
        Ok(response) => response,
        Err(err) => {
            state.observer.observe(&ExchangeEvent::Failed {
                exchange_id,
                status: err.status(),
                error: err.chain(),
            });
            err.into_response()
        }
    };

    metrics::record_exchange(&method, response.status().as_u16(), started);
    response
}

async fn forward(
    state: &AppState,
    exchange_id: Uuid,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let outbound = state.director.direct(exchange_id, request).await?;
    state.transport.round_trip(exchange_id, outbound).await
}
