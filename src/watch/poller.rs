//! Long-poll loop for one watched kind.
//!
//! Every kind runs the same loop, parameterized only by its
//! [`WatchedKind`]:
//!
//! ```text
//! loop {
//!     shutdown signaled?        -> return Ok
//!     fetch(kind, watermark)    (aborted if shutdown fires mid-call)
//!       Fetched, index moved    -> emit event, advance watermark
//!       Fetched, same index     -> no-op, poll again
//!       TimedOut                -> no-op, poll again
//!       Err                     -> back off and retry, or escalate
//! }
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::retry::RetryPolicy;
use super::sink::EventSink;
use crate::domain::{Advance, WatchEvent, WatchedKind, Watermark, WatermarkTracker};
use crate::error::WatchError;
use crate::upstream::{PollOutcome, ResourceSource};

/// Owns the watermark for one kind and drives its long-poll loop.
#[derive(Debug)]
pub struct ResourcePoller {
    kind: WatchedKind,
    source: Arc<dyn ResourceSource>,
    sink: Arc<dyn EventSink>,
    retry: RetryPolicy,
    tracker: WatermarkTracker,
}

impl ResourcePoller {
    /// Creates a poller starting at [`Watermark::ZERO`].
    #[must_use]
    pub fn new(
        kind: WatchedKind,
        source: Arc<dyn ResourceSource>,
        sink: Arc<dyn EventSink>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            kind,
            source,
            sink,
            retry,
            tracker: WatermarkTracker::new(),
        }
    }

    /// Runs until `shutdown` fires or a failure must be escalated.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Poll`] once the retry budget is exhausted, or
    /// [`WatchError::SinkWrite`] if the sink rejects an event.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), WatchError> {
        let mut failures: u32 = 0;

        loop {
            if shutdown.is_cancelled() {
                tracing::debug!(kind = %self.kind, "poller observed shutdown");
                return Ok(());
            }

            let index = self.tracker.current();
            let outcome = tokio::select! {
                biased;
                () = shutdown.cancelled() => continue,
                outcome = self.source.fetch(&self.kind, index) => outcome,
            };

            match outcome {
                Ok(PollOutcome::Fetched { payload, index }) => {
                    failures = 0;
                    self.handle_fetched(payload, index).await?;
                }
                Ok(PollOutcome::TimedOut) => {
                    failures = 0;
                    tracing::trace!(kind = %self.kind, %index, "long-poll timed out, retrying");
                }
                Err(source) => {
                    failures = failures.saturating_add(1);
                    if !self.retry.allows(failures) {
                        tracing::error!(
                            kind = %self.kind,
                            attempts = failures,
                            error = %source,
                            "poller giving up"
                        );
                        return Err(WatchError::Poll {
                            kind: self.kind,
                            source,
                        });
                    }

                    let delay = self.retry.delay(failures - 1);
                    tracing::warn!(
                        kind = %self.kind,
                        attempt = failures,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %source,
                        "poll failed, backing off"
                    );
                    tokio::select! {
                        biased;
                        () = shutdown.cancelled() => {}
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    async fn handle_fetched(
        &mut self,
        payload: serde_json::Value,
        index: Watermark,
    ) -> Result<(), WatchError> {
        let previous = self.tracker.current();
        match self.tracker.advance(index) {
            step if step.should_emit() => {
                let kind = self.kind.event_kind();
                tracing::debug!(%kind, %index, "emitting event");
                self.sink.emit(WatchEvent::new(kind, payload, index)).await
            }
            Advance::Regressed => {
                tracing::warn!(
                    kind = %self.kind,
                    %previous,
                    %index,
                    "upstream index went backwards, keeping watermark"
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
