//! Scripted [`ResourceSource`] used by the watch engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Watermark, WatchedKind};
use crate::error::UpstreamError;
use crate::upstream::{PollOutcome, ResourceSource};

/// One scripted answer.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Fetch(u64, serde_json::Value),
    TimedOut,
    Fail,
}

/// Answers each kind from its own queue. Once a queue is empty the call
/// blocks forever, like a long-poll with nothing to report.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    scripts: Mutex<HashMap<WatchedKind, VecDeque<Step>>>,
    calls: Mutex<Vec<(WatchedKind, Watermark)>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, kind: WatchedKind, steps: Vec<Step>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(kind).or_default().extend(steps);
        }
        self
    }

    /// Watermarks passed to `fetch` for `kind`, in call order.
    pub(crate) fn watermarks(&self, kind: &WatchedKind) -> Vec<Watermark> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(k, _)| k == kind)
                    .map(|(_, w)| *w)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResourceSource for ScriptedSource {
    async fn fetch(
        &self,
        kind: &WatchedKind,
        index: Watermark,
    ) -> Result<PollOutcome, UpstreamError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((kind.clone(), index));
        }
        let step = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.get_mut(kind).and_then(VecDeque::pop_front));

        match step {
            Some(Step::Fetch(next, payload)) => Ok(PollOutcome::Fetched {
                payload,
                index: Watermark::new(next),
            }),
            Some(Step::TimedOut) => Ok(PollOutcome::TimedOut),
            Some(Step::Fail) => Err(UpstreamError::Status {
                status: 503,
                body: "no cluster leader".to_string(),
            }),
            None => std::future::pending().await,
        }
    }
}
