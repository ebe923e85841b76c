//! # nomad-watch
//!
//! Streams Nomad cluster state to WebSocket clients in real time.
//!
//! Every connected client gets one watch session: a set of long-polling
//! loops against Nomad's blocking-query API (allocations, evaluations,
//! jobs, nodes, plus any single resource the client asks for), each
//! tracking its own change index and forwarding every new snapshot as a
//! `{"Kind": ..., "Payload": ...}` event over the socket.
//!
//! ## Architecture
//!
//! ```text
//! Client (WebSocket /ws)        REST (/api/v1/sessions, /health)
//!     │                                  │
//!     ├── ws/ connection task ───────────┤
//!     │       (single socket writer)     │
//!     │                                  │
//!     ├── WatchSession (watch/) ◀── SessionRegistry
//!     │     ├── ResourcePoller × N
//!     │     └── ChannelSink
//!     │
//!     └── ResourceSource (upstream/) ── Nomad HTTP API
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod upstream;
pub mod watch;
pub mod ws;
