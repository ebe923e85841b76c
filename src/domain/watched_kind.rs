//! Resource kinds a watch session can follow.
//!
//! Each [`WatchedKind`] names one upstream list/info endpoint and the
//! [`EventKind`] tag attached to whatever that endpoint returns.

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

/// Tag carried in the `Kind` field of every outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Full allocation list.
    FetchedAllocs,
    /// A single allocation.
    FetchedAlloc,
    /// Full evaluation list.
    FetchedEvals,
    /// A single evaluation.
    FetchedEval,
    /// Full job list.
    FetchedJobs,
    /// A single job.
    FetchedJob,
    /// Full node list.
    FetchedNodes,
    /// A single node.
    FetchedNode,
}

impl EventKind {
    /// Returns the wire tag as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FetchedAllocs => "fetched_allocs",
            Self::FetchedAlloc => "fetched_alloc",
            Self::FetchedEvals => "fetched_evals",
            Self::FetchedEval => "fetched_eval",
            Self::FetchedJobs => "fetched_jobs",
            Self::FetchedJob => "fetched_job",
            Self::FetchedNodes => "fetched_nodes",
            Self::FetchedNode => "fetched_node",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource collection, or a single resource by identifier, that one
/// poller follows for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchedKind {
    /// Every allocation in the cluster.
    Allocations,
    /// Every evaluation in the cluster.
    Evaluations,
    /// Every registered job.
    Jobs,
    /// Every client node.
    Nodes,
    /// One job by ID.
    Job(String),
    /// One allocation by ID.
    Allocation(String),
    /// One evaluation by ID.
    Evaluation(String),
    /// One node by ID.
    Node(String),
}

impl WatchedKind {
    /// The collections every new session watches.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::Allocations, Self::Evaluations, Self::Jobs, Self::Nodes]
    }

    /// Path of the upstream endpoint relative to `/v1/`, for display.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.path_segments().join("/")
    }

    /// Path segments of the upstream endpoint below `/v1`. Resource IDs
    /// stay a single segment and are percent-encoded when joined into a URL.
    #[must_use]
    pub fn path_segments(&self) -> Vec<&str> {
        match self {
            Self::Allocations => vec!["allocations"],
            Self::Evaluations => vec!["evaluations"],
            Self::Jobs => vec!["jobs"],
            Self::Nodes => vec!["nodes"],
            Self::Job(id) => vec!["job", id.as_str()],
            Self::Allocation(id) => vec!["allocation", id.as_str()],
            Self::Evaluation(id) => vec!["evaluation", id.as_str()],
            Self::Node(id) => vec!["node", id.as_str()],
        }
    }

    /// Tag attached to events produced for this kind.
    #[must_use]
    pub const fn event_kind(&self) -> EventKind {
        match self {
            Self::Allocations => EventKind::FetchedAllocs,
            Self::Allocation(_) => EventKind::FetchedAlloc,
            Self::Evaluations => EventKind::FetchedEvals,
            Self::Evaluation(_) => EventKind::FetchedEval,
            Self::Jobs => EventKind::FetchedJobs,
            Self::Job(_) => EventKind::FetchedJob,
            Self::Nodes => EventKind::FetchedNodes,
            Self::Node(_) => EventKind::FetchedNode,
        }
    }
}

impl fmt::Display for WatchedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint())
    }
}
