//! Inbound WebSocket control messages.
//!
//! Clients may send JSON text frames tagged by `command` to follow a single
//! resource in addition to the default collections:
//!
//! ```json
//! { "command": "watch_job", "id": "web-frontend" }
//! ```
//!
//! Anything that does not parse is treated as a keep-alive.

use serde::Deserialize;

use crate::domain::WatchedKind;
use crate::watch::SessionCommand;

/// Commands a client can send over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WatchCommand {
    /// Follow one job.
    WatchJob {
        /// Job ID.
        id: String,
    },
    /// Follow one allocation.
    WatchAllocation {
        /// Allocation ID.
        id: String,
    },
    /// Follow one evaluation.
    WatchEvaluation {
        /// Evaluation ID.
        id: String,
    },
    /// Follow one node.
    WatchNode {
        /// Node ID.
        id: String,
    },
}

impl WatchCommand {
    /// Parses a text frame. Returns `None` for anything that is not a
    /// well-formed command with a usable ID. Dot segments are refused since
    /// they cannot name a resource.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let command = serde_json::from_str::<Self>(text).ok()?;
        let id = command.id().trim();
        (!id.is_empty() && id != "." && id != "..").then_some(command)
    }

    /// The resource ID the command refers to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::WatchJob { id }
            | Self::WatchAllocation { id }
            | Self::WatchEvaluation { id }
            | Self::WatchNode { id } => id,
        }
    }

    /// The kind the session should start following.
    #[must_use]
    pub fn into_kind(self) -> WatchedKind {
        match self {
            Self::WatchJob { id } => WatchedKind::Job(id),
            Self::WatchAllocation { id } => WatchedKind::Allocation(id),
            Self::WatchEvaluation { id } => WatchedKind::Evaluation(id),
            Self::WatchNode { id } => WatchedKind::Node(id),
        }
    }
}

impl From<WatchCommand> for SessionCommand {
    fn from(command: WatchCommand) -> Self {
        Self::Watch(command.into_kind())
    }
}
