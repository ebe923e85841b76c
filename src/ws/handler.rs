//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::WatchError;

/// `GET /ws` — Upgrade HTTP connection to WebSocket and start streaming.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_failed_upgrade(|error: axum::Error| {
        let error = WatchError::ConnectionSetup(error.to_string());
        tracing::warn!(%error, "websocket upgrade failed");
    })
    .on_upgrade(move |socket| run_connection(socket, state))
}
