//! Watch engine: pollers, the shared event sink, and session lifecycle.
//!
//! ```text
//! WatchSession ── supervisor task
//!     ├── ResourcePoller(allocations) ─┐
//!     ├── ResourcePoller(evaluations) ─┤
//!     ├── ResourcePoller(jobs)        ─┼──▶ EventSink ──▶ connection writer
//!     └── ResourcePoller(nodes)       ─┘
//! ```

#[cfg(test)]
pub(crate) mod fakes;
pub mod poller;
pub mod registry;
pub mod retry;
pub mod session;
pub mod sink;

pub use poller::ResourcePoller;
pub use registry::SessionRegistry;
pub use retry::RetryPolicy;
pub use session::{SessionCommand, StopReason, WatchSession};
pub use sink::{ChannelSink, EventSink};
