//! Session DTOs for the list and detail endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::SessionSummary;

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// Sessions on the requested page, oldest first.
    pub data: Vec<SessionSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
