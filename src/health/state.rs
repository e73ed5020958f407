//! Endpoint health state machine.
//!
//! # States
//! - Healthy: endpoint may be selected for traffic
//! - Unhealthy: endpoint skipped unless every endpoint is unhealthy
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: consecutive errors >= max_consecutive_errors
//!                      or a success slower than the latency threshold
//! Unhealthy → Healthy: a success within the latency threshold
//! ```

use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Health record for one endpoint.
///
/// Invariant: `consecutive_errors <= error_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointStatus {
    pub endpoint: String,
    pub healthy: bool,
    /// Unix time in milliseconds of the last report.
    pub last_checked_ms: Option<u64>,
    pub latency_ms: Option<u64>,
    /// Total errors ever reported.
    pub error_count: u64,
    /// Errors since the last success.
    pub consecutive_errors: u64,
}

impl EndpointStatus {
    /// New endpoints start healthy.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            healthy: true,
            last_checked_ms: None,
            latency_ms: None,
            error_count: 0,
            consecutive_errors: 0,
        }
    }

    /// Apply a successful call. A missing latency counts as acceptable.
    pub fn record_success(&mut self, latency: Option<Duration>, latency_threshold: Duration) {
        self.consecutive_errors = 0;
        self.last_checked_ms = Some(unix_millis());
        if let Some(latency) = latency {
            self.latency_ms = Some(latency.as_millis() as u64);
        }
        self.healthy = latency.map_or(true, |l| l <= latency_threshold);
    }

    /// Apply a failed call.
    pub fn record_error(&mut self, max_consecutive_errors: u64) {
        self.error_count += 1;
        self.consecutive_errors += 1;
        self.last_checked_ms = Some(unix_millis());
        if self.consecutive_errors >= max_consecutive_errors {
            self.healthy = false;
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
