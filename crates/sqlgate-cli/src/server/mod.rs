//! HTTP server module for serve mode.
//!
//! Binds to localhost only and exposes the REST API under `/api`. Any
//! number of requests may be in flight; each one runs its own orchestrator
//! instance, and a dropped client connection drops the handler future,
//! which abandons the in-flight generator call.

pub mod api;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

pub use state::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Run the HTTP server until Ctrl+C.
pub async fn run_server(state: Arc<AppState>, port: u16) -> Result<()> {
    let app = build_router(state, port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    println!("sqlgate: server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    println!("\nsqlgate: server stopped");
    Ok(())
}

/// Build the main router with all routes.
///
/// CORS is restricted to same-origin: the server binds to localhost, and
/// without this any website could post questions to the local gate.
pub fn build_router(state: Arc<AppState>, port: u16) -> Router {
    let allowed_origins = [
        format!("http://localhost:{port}").parse().unwrap(),
        format!("http://127.0.0.1:{port}").parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", api::api_routes())
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
}
