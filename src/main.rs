//! route-service
//!
//! A TLS-terminating route service for reverse-proxy-fronted platforms.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────────┐
//!                        │                   ROUTE SERVICE                   │
//!                        │                                                   │
//!   Platform router      │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!   X-Cf-Forwarded-Url ──┼─▶│   net   │───▶│   http   │───▶│  director   │  │
//!   X-Cf-Proxy-Signature │  │   tls   │    │  server  │    │delay+rewrite│  │
//!                        │  └─────────┘    └──────────┘    └──────┬──────┘  │
//!                        │                                        │         │
//!                        │                                        ▼         │
//!   Relayed response     │  ┌──────────┐                   ┌─────────────┐  │
//!   ◀────────────────────┼──│ response │◀──────────────────│  transport  │◀─┼── Backend
//!                        │  │ (errors) │                   │ trust policy│  │
//!                        │  └──────────┘                   └─────────────┘  │
//!                        │                                                   │
//!                        │  config · observability · resilience · lifecycle │
//!                        └───────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use route_service::config::Cli;
use route_service::lifecycle::startup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Err(e) = startup::run(cli).await {
        tracing::error!(error = %e, "route-service failed");
        return Err(e.into());
    }
    Ok(())
}
