//! Watch session lifecycle states and summaries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::SessionId;

/// Lifecycle of a watch session.
///
/// States only move forward: `Created → Running → Stopping → Stopped`.
/// The ordering of the variants encodes that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Built but pollers not yet spawned.
    Created,
    /// Pollers active.
    Running,
    /// Shutdown signaled, pollers draining.
    Stopping,
    /// Terminal.
    Stopped,
}

impl SessionState {
    /// Returns the state as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lightweight view of a session for the REST endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: SessionId,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Upstream endpoints being watched (e.g. `"allocations"`, `"job/web"`).
    pub watching: Vec<String>,
    /// When the connection was accepted.
    pub created_at: DateTime<Utc>,
}
