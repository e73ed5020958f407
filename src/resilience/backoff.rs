//! Multiplicative backoff schedule.

use std::time::Duration;

/// Produces a growing sequence of delays: `interval, interval*m, interval*m², …`,
/// optionally capped.
///
/// The running delay is kept as `f64` milliseconds so repeated multiplication
/// does not accumulate rounding; each yielded delay is rounded to whole ms.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    current_ms: f64,
    multiplier: f64,
    max_ms: Option<f64>,
}

impl BackoffSchedule {
    pub fn new(interval_ms: u64, multiplier: f64, max_interval_ms: Option<u64>) -> Self {
        Self {
            current_ms: interval_ms as f64,
            multiplier,
            max_ms: max_interval_ms.map(|m| m as f64),
        }
    }

    /// The delay that the next `advance` will return, in milliseconds.
    pub fn peek_ms(&self) -> u64 {
        self.capped().round() as u64
    }

    /// Return the current delay and grow the schedule.
    pub fn advance(&mut self) -> Duration {
        let delay = self.peek_ms();
        self.current_ms = self.capped() * self.multiplier;
        Duration::from_millis(delay)
    }

    fn capped(&self) -> f64 {
        match self.max_ms {
            Some(max) => self.current_ms.min(max),
            None => self.current_ms,
        }
    }
}
