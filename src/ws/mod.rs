//! WebSocket layer: upgrade, per-connection session lifecycle, commands.
//!
//! The endpoint at `/ws` streams `{"Kind": ..., "Payload": ...}` events for
//! as long as the client stays connected.

pub mod connection;
pub mod handler;
pub mod messages;
