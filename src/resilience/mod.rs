//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! RPC call:
//!     → throttle.rs (space calls against the provider's rate budget)
//!
//! Confirmation polling:
//!     → backoff.rs (multiplicative delay between polls)
//! ```
//!
//! # Design Decisions
//! - All waiting goes through tokio::time so tests can pause the clock
//! - No jitter: confirmation delays are a deterministic schedule

pub mod backoff;
pub mod throttle;

pub use backoff::BackoffSchedule;
pub use throttle::Throttle;
