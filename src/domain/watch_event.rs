//! Outbound events produced by pollers.
//!
//! A [`WatchEvent`] is created exactly once per successful poll and moved
//! into the event sink. On the wire it is `{"Kind": <tag>, "Payload": ...}`
//! with the payload passed through from the upstream response verbatim.

use serde::Serialize;

use super::{EventKind, Watermark};

/// One fetched snapshot of a watched resource.
#[derive(Debug, Clone, Serialize)]
pub struct WatchEvent {
    /// Which resource the payload describes.
    #[serde(rename = "Kind")]
    pub kind: EventKind,

    /// Upstream response body, untouched.
    #[serde(rename = "Payload")]
    pub payload: serde_json::Value,

    /// Upstream index the payload was fetched at. Not serialized.
    #[serde(skip)]
    pub index: Watermark,
}

impl WatchEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(kind: EventKind, payload: serde_json::Value, index: Watermark) -> Self {
        Self {
            kind,
            payload,
            index,
        }
    }

    /// Serializes the event into its wire representation.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the payload cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
