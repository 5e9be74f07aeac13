//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use inkcalc_analyzer::Analyzer;

use crate::handler;
use crate::health_api;

/// Application state shared across routes.
pub struct AppState {
    pub analyzer: Analyzer,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            started_at: Instant::now(),
        }
    }
}

/// Build the router with all routes, CORS, and request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health_api::root))
        .route("/api/health", get(health_api::get_health))
        .route("/calculate", post(handler::calculate))
        .route("/calculate/", post(handler::calculate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server and serves until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server is starting up, listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server is shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
