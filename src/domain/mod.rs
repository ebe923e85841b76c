//! Domain layer: watched kinds, watermarks, events and session identity.
//!
//! Plain data types shared by the upstream client, the watch engine and
//! the HTTP surface. Nothing in here performs I/O.

pub mod session_id;
pub mod session_state;
pub mod watch_event;
pub mod watched_kind;
pub mod watermark;

pub use session_id::SessionId;
pub use session_state::{SessionState, SessionSummary};
pub use watch_event::WatchEvent;
pub use watched_kind::{EventKind, WatchedKind};
pub use watermark::{Advance, Watermark, WatermarkTracker};
