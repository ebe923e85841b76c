//! Per-poller retry policy.
//!
//! A failed long-poll is retried up to [`RetryPolicy::max_retries`] times
//! with exponential backoff before the failure is escalated to the session.
//! The delay for retry `n` (0-indexed) is `first × factor^n`, clamped to
//! `max`.

use std::time::Duration;

/// Exponential backoff with a retry budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound on any single delay.
    pub max: Duration,
    /// Multiplicative growth factor.
    pub factor: f64,
    /// Consecutive failures tolerated before escalating. `0` escalates on
    /// the first failure.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            first: Duration::from_millis(500),
            max: Duration::from_secs(10),
            factor: 2.0,
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// A policy that escalates immediately.
    #[must_use]
    pub fn fail_fast() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Whether another retry is allowed after `failures` consecutive
    /// failures.
    #[must_use]
    pub const fn allows(&self, failures: u32) -> bool {
        failures <= self.max_retries
    }
}
