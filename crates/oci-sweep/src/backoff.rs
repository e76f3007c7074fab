//! Linear back-off schedule for retry rounds
//!
//! `backon` ships constant, exponential and Fibonacci schedules. Retry rounds
//! between deletion passes grow linearly (`step * round`), so this module
//! adds a [`LinearBuilder`] that plugs into the same `BackoffBuilder` API.

use backon::BackoffBuilder;
use std::time::Duration;

/// Builder for a linear back-off: `step`, `2 * step`, `3 * step`, ...
#[derive(Debug, Clone, Copy)]
pub struct LinearBuilder {
    step: Duration,
    max_times: Option<usize>,
}

impl LinearBuilder {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            max_times: None,
        }
    }

    /// Stop after `max_times` delays
    pub fn with_max_times(mut self, max_times: usize) -> Self {
        self.max_times = Some(max_times);
        self
    }
}

impl BackoffBuilder for LinearBuilder {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            step: self.step,
            max_times: self.max_times,
            attempts: 0,
        }
    }
}

/// Iterator produced by [`LinearBuilder`]
#[derive(Debug)]
pub struct LinearBackoff {
    step: Duration,
    max_times: Option<usize>,
    attempts: usize,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.max_times.is_some_and(|max| self.attempts >= max) {
            return None;
        }
        self.attempts += 1;
        let factor = u32::try_from(self.attempts).unwrap_or(u32::MAX);
        Some(self.step.checked_mul(factor).unwrap_or(Duration::MAX))
    }
}
