//! nomad-watch server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket stream and REST
//! endpoints.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use nomad_watch::api;
use nomad_watch::app_state::AppState;
use nomad_watch::config::WatchConfig;
use nomad_watch::upstream::NomadClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = WatchConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        upstream = %config.nomad_addr,
        wait_secs = config.wait.as_secs(),
        "starting nomad-watch"
    );

    // Build upstream client
    let client = NomadClient::new(&config.nomad_addr, config.wait)?;

    // Build application state
    let listen_addr = config.listen_addr;
    let app_state = AppState::new(config, Arc::new(client));

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
