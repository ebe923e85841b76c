//! Event sink shared by every poller of a session.
//!
//! Pollers hand each [`WatchEvent`] to an [`EventSink`]. The production
//! sink, [`ChannelSink`], funnels all of them into one bounded
//! [`tokio::sync::mpsc`] queue drained by the connection's single writer,
//! so writes to the socket never interleave. Events from one poller keep
//! their production order; no order is promised across pollers.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::WatchEvent;
use crate::error::WatchError;

/// Accepts one event at a time from any number of concurrent pollers.
#[async_trait]
pub trait EventSink: Send + Sync + std::fmt::Debug {
    /// Takes ownership of `event` and queues it for the outbound
    /// connection. May wait while the connection applies backpressure.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::SinkWrite`] when the outbound connection is
    /// gone. Callers treat this as fatal to the session.
    async fn emit(&self, event: WatchEvent) -> Result<(), WatchError>;
}

/// [`EventSink`] backed by a bounded mpsc queue.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<WatchEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end the writer drains.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<WatchEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Returns `true` once the writer has dropped its receiver.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: WatchEvent) -> Result<(), WatchError> {
        let kind = event.kind;
        self.tx
            .send(event)
            .await
            .map_err(|_| WatchError::SinkWrite(format!("writer gone while sending {kind}")))
    }
}
