//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Session endpoints are mounted under `/api/v1`; `/health` and `/ws` sit
//! at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the REST endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::system::health_handler,
        handlers::session::list_sessions,
        handlers::session::get_session,
        handlers::session::stop_session,
    ),
    components(schemas(
        crate::domain::SessionSummary,
        crate::domain::SessionState,
        crate::domain::EventKind,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        dto::SessionListResponse,
        dto::PaginationMeta,
    )),
    tags(
        (name = "System", description = "Service health"),
        (name = "Sessions", description = "Live watch sessions"),
    )
)]
pub struct ApiDoc;

/// Builds the complete router: REST endpoints plus the `/ws` stream.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
