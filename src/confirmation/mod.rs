//! Transaction confirmation.
//!
//! # Data Flow
//! ```text
//! TxId from submit
//!     → tracker.rs (poll, back off, poll again)
//!     → Confirmation | ConfirmError::{Failed, Timeout, Cancelled}
//! ```
//!
//! # Design Decisions
//! - Timeout is not failure: the identifier is always handed back so the
//!   caller can re-check instead of resubmitting
//! - The status source is injected per call, so one tracker serves any endpoint

pub mod tracker;
pub mod types;

pub use tracker::ConfirmationTracker;
pub use types::{
    AttemptOutcome, Confirmation, ConfirmationAttempt, ConfirmError, ConfirmOptions,
};
