//! Exponential reconnect backoff.

use std::time::Duration;

/// Growth factor applied after every consecutive failure.
const GROWTH_FACTOR: u32 = 2;

/// Exponential backoff for slow reconnects.
///
/// Hands out the current delay and then doubles it, never exceeding `max`.
/// A successful connection resets the delay to `initial`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl BackoffPolicy {
    /// Create a policy starting at `initial` and capped at `max`.
    ///
    /// An `initial` above `max` is clamped down to `max`.
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// The delay the next failure will be scheduled with.
    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    /// Take the delay for this failure and grow the one for the next.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.grow();
        delay
    }

    /// Grow the current delay, saturating at the maximum.
    pub fn grow(&mut self) {
        self.current = self
            .current
            .checked_mul(GROWTH_FACTOR)
            .map_or(self.max, |grown| grown.min(self.max));
    }

    /// Back to the minimum delay.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
