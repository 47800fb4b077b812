//! HMS Development Server
//!
//! An in-memory REST backend for the hospital admin console. Every
//! response is enveloped as `{data, message?, status}`.
//!
//! # Configuration
//!
//! Environment variables:
//! - `HMS_PORT`: Port to listen on (default: 8080)
//! - `HMS_API_TOKEN`: Bearer token required on `/api/v1` routes (default: none)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `/api/v1/patients`, `/api/v1/staff`, `/api/v1/tasks`,
//!   `/api/v1/appointments` and their nested paths

use hms::server::{app, AppState, ServerConfig, Store, API_PREFIX};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hms_server=info,hms=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    let mut state = AppState::new(Arc::new(Store::new()));
    match &config.token {
        Some(token) => {
            tracing::info!("Bearer token required on {}", API_PREFIX);
            state = state.with_token(token.as_str());
        }
        None => tracing::warn!("HMS_API_TOKEN not set - API routes are open"),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
