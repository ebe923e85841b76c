//! The long-poll contract pollers depend on.

use async_trait::async_trait;

use crate::domain::{Watermark, WatchedKind};
use crate::error::UpstreamError;

/// Result of one successful blocking call.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Upstream answered with a payload and its current index.
    Fetched {
        /// Response body, passed through unchanged.
        payload: serde_json::Value,
        /// Upstream's reported last index.
        index: Watermark,
    },
    /// The request hit the client-side long-poll deadline with no answer.
    /// Retry with the same watermark.
    TimedOut,
}

/// Something that can perform a blocking list/info call for a kind.
///
/// `fetch` blocks until upstream reports a change at or after `index`, or
/// until the long-poll timeout elapses. Implementations must be cancel-safe:
/// pollers drop the future when their session shuts down.
///
/// ```rust,ignore
/// let outcome = source.fetch(&WatchedKind::Jobs, Watermark::ZERO).await?;
/// ```
#[async_trait]
pub trait ResourceSource: Send + Sync + std::fmt::Debug {
    /// Performs one long-poll for `kind` starting from `index`.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] when upstream is unreachable, answers
    /// with a non-success status, or returns a malformed body.
    async fn fetch(&self, kind: &WatchedKind, index: Watermark)
    -> Result<PollOutcome, UpstreamError>;
}
