//! Change-index watermarks.
//!
//! A [`Watermark`] is the last upstream index a poller has observed for
//! one kind. [`WatermarkTracker`] owns it and only ever moves it forward.

use std::fmt;

/// Monotonic upstream change index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(u64);

impl Watermark {
    /// The starting watermark of every poller.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw index.
    #[must_use]
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of offering a freshly fetched index to a [`WatermarkTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// First successful poll of the loop; always emitted.
    Initial,
    /// Index moved forward.
    Forward,
    /// Index equals the current watermark; the long-poll returned without
    /// a change.
    Unchanged,
    /// Index is below the current watermark. The watermark is kept.
    Regressed,
}

impl Advance {
    /// Whether the fetched payload should be forwarded to the sink.
    #[must_use]
    pub const fn should_emit(&self) -> bool {
        matches!(self, Self::Initial | Self::Forward)
    }
}

/// Per-poller watermark state. Starts at [`Watermark::ZERO`].
#[derive(Debug, Default)]
pub struct WatermarkTracker {
    current: Watermark,
    observed: bool,
}

impl WatermarkTracker {
    /// Creates a tracker at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The watermark to pass into the next poll.
    #[must_use]
    pub const fn current(&self) -> Watermark {
        self.current
    }

    /// Offers the index reported by a successful poll.
    pub fn advance(&mut self, next: Watermark) -> Advance {
        let first = !self.observed;
        self.observed = true;

        if next > self.current {
            self.current = next;
            if first { Advance::Initial } else { Advance::Forward }
        } else if first {
            Advance::Initial
        } else if next == self.current {
            Advance::Unchanged
        } else {
            Advance::Regressed
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let tracker = WatermarkTracker::new();
        assert_eq!(tracker.current(), Watermark::ZERO);
    }

    #[test]
    fn first_poll_always_emits() {
        let mut tracker = WatermarkTracker::new();
        assert_eq!(tracker.advance(Watermark::new(5)), Advance::Initial);
        assert_eq!(tracker.current(), Watermark::new(5));

        let mut empty = WatermarkTracker::new();
        assert!(empty.advance(Watermark::ZERO).should_emit());
    }

    #[test]
    fn equal_index_is_a_no_op() {
        let mut tracker = WatermarkTracker::new();
        tracker.advance(Watermark::new(5));
        let step = tracker.advance(Watermark::new(5));
        assert_eq!(step, Advance::Unchanged);
        assert!(!step.should_emit());
    }

    #[test]
    fn never_regresses() {
        let mut tracker = WatermarkTracker::new();
        tracker.advance(Watermark::new(9));
        assert_eq!(tracker.advance(Watermark::new(3)), Advance::Regressed);
        assert_eq!(tracker.current(), Watermark::new(9));
        assert_eq!(tracker.advance(Watermark::new(12)), Advance::Forward);
        assert_eq!(tracker.current(), Watermark::new(12));
    }

    #[test]
    fn observed_sequence_is_non_decreasing() {
        let mut tracker = WatermarkTracker::new();
        let mut seen = Vec::new();
        for index in [4_u64, 4, 7, 2, 7, 11, 10, 15] {
            tracker.advance(Watermark::new(index));
            seen.push(tracker.current());
        }
        assert!(seen.windows(2).all(|w| matches!(w, [a, b] if a <= b)));
    }
}
