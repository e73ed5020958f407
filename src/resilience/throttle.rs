//! Minimum-spacing throttle for outbound RPC calls.
//!
//! # Responsibilities
//! - Guarantee at least `min_delay` between consecutive calls through one instance
//! - Serve concurrent callers in arrival order
//!
//! # Design Decisions
//! - The slot is reserved under a short lock, the sleep happens outside it
//! - One instance per rate-limit budget; instances are independent

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ThrottleConfig;
use crate::observability::metrics;

#[derive(Debug)]
pub struct Throttle {
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(Duration::from_millis(config.min_delay_ms))
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Wait until this caller's slot comes up.
    ///
    /// The first call after construction or `reset` returns immediately.
    pub async fn wait(&self) {
        let now = Instant::now();
        let slot = {
            let mut last = self
                .last_request
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let slot = match *last {
                Some(prev) => (prev + self.min_delay).max(now),
                None => now,
            };
            *last = Some(slot);
            slot
        };

        let waited = slot.saturating_duration_since(now);
        if !waited.is_zero() {
            tracing::trace!(wait_ms = waited.as_millis() as u64, "Throttling request");
            tokio::time::sleep_until(slot).await;
        }
        metrics::record_throttle_wait(waited);
    }

    /// Forget the last request time so the next call passes immediately.
    pub fn reset(&self) {
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}
