//! Session handlers: list, inspect and stop live watch sessions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{PaginationParams, SessionListResponse};
use crate::app_state::AppState;
use crate::domain::{SessionId, SessionSummary};
use crate::error::{ErrorResponse, WatchError};

/// `GET /sessions` — List live sessions.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "List watch sessions",
    description = "Returns a paginated list of live sessions, one per connected WebSocket client.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated session list", body = SessionListResponse),
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let summaries = state.sessions.list().await;
    let (data, pagination) = params.paginate(summaries);
    Json(SessionListResponse { data, pagination })
}

/// `GET /sessions/{id}` — Inspect one session.
///
/// # Errors
///
/// Returns [`WatchError::SessionNotFound`] if no such session is live.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    summary = "Get session details",
    description = "Returns the lifecycle state and watched endpoints of one session.",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
    ),
    responses(
        (status = 200, description = "Session details", body = SessionSummary),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, WatchError> {
    let session = state.sessions.get(SessionId::from_uuid(id)).await?;
    Ok(Json(session.summary().await))
}

/// `DELETE /sessions/{id}` — Stop a session.
///
/// The session's pollers are signaled and its connection is closed. The
/// session leaves the registry once its connection task exits.
///
/// # Errors
///
/// Returns [`WatchError::SessionNotFound`] if no such session is live.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    summary = "Stop a session",
    description = "Signals every poller of the session to stop and closes its WebSocket.",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
    ),
    responses(
        (status = 202, description = "Stop signaled"),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn stop_session(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, WatchError> {
    let session = state.sessions.get(SessionId::from_uuid(id)).await?;
    session.stop();
    tracing::info!(session_id = %session.id(), "stop requested over REST");
    Ok(StatusCode::ACCEPTED)
}

/// Session management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(stop_session))
}
