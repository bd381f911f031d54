//! Error responses.
//!
//! # Responsibilities
//! - Map per-request failures to status codes the router understands
//!
//! # Design Decisions
//! - Upstream responses are relayed untouched; only failures produced here
//!   carry a body written by the route service
//! - Missing or bad destination → 400, upstream unreachable → 502,
//!   upstream too slow → 504

use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::proxy::error::ProxyError;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{}\n", self),
        )
            .into_response()
    }
}
