//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Cancellation (cancel.rs):
//!     CancelToken::cancel → health probe loop exits
//!                         → confirmation polling stops with Cancelled
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → CLI cancels its tokens and stops the monitor
//! ```

pub mod cancel;
pub mod signals;

pub use cancel::CancelToken;
