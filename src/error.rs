//! Error types for the upstream client and the watch engine.
//!
//! [`UpstreamError`] describes a failed long-poll. [`WatchError`] is the
//! central error type of the service: it covers session-fatal failures and
//! maps to an HTTP status code and structured JSON body for the REST
//! endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{SessionId, WatchedKind};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "session not found: 6f1c…"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// A single long-poll against the upstream API failed.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The request could not be sent or the connection broke.
    #[error("upstream unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// Upstream body was not valid JSON.
    #[error("malformed upstream response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The blocking-query index header was absent or not an integer.
    #[error("upstream response carried no usable change index")]
    MissingIndex,

    /// The configured upstream address is not a valid URL.
    #[error("invalid upstream address: {0}")]
    InvalidAddress(String),
}

/// Service-wide error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Upstream/Server | 502 / 500                    |
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The WebSocket upgrade could not be completed.
    #[error("connection setup failed: {0}")]
    ConnectionSetup(String),

    /// A poller gave up on its upstream endpoint.
    #[error("poll of {kind} failed: {source}")]
    Poll {
        /// Kind whose poller failed.
        kind: WatchedKind,
        /// Last upstream failure.
        #[source]
        source: UpstreamError,
    },

    /// The outbound connection is gone.
    #[error("event sink closed: {0}")]
    SinkWrite(String),

    /// The session has already been told to stop.
    #[error("session is closed")]
    SessionClosed,

    /// `start` was called on a session that is not in `Created`.
    #[error("session already started")]
    AlreadyStarted,

    /// No live session with the given ID.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal failure, e.g. a poller task panicked.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WatchError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::SessionNotFound(_) => 2001,
            Self::SessionClosed => 2002,
            Self::AlreadyStarted => 2003,
            Self::ConnectionSetup(_) => 3000,
            Self::Poll { .. } => 3001,
            Self::SinkWrite(_) => 3002,
            Self::Internal(_) => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::SessionClosed | Self::AlreadyStarted => StatusCode::CONFLICT,
            Self::Poll { .. } => StatusCode::BAD_GATEWAY,
            Self::ConnectionSetup(_) | Self::SinkWrite(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
