//! Resilient ledger client runtime.
//!
//! # Architecture Overview
//!
//! ```text
//!     caller
//!       │
//!       ▼
//!  ┌────────────────────────┐     ┌──────────────┐
//!  │ TransactionOrchestrator│────▶│    amount    │  parse + convert (checked u64)
//!  └──────────┬─────────────┘     └──────────────┘
//!             │
//!             ▼
//!  ┌────────────────────────┐     ┌──────────────┐
//!  │      RoutedLedger      │────▶│   Throttle   │  min spacing, FIFO
//!  │  (one conn/endpoint)   │     └──────────────┘
//!  └──────────┬─────────────┘
//!             │ get_healthy_endpoint / report_*
//!             ▼
//!  ┌────────────────────────┐     ┌──────────────┐
//!  │ EndpointHealthMonitor  │◀────│ probe loop   │  periodic, concurrent
//!  └────────────────────────┘     └──────────────┘
//!             │
//!             ▼
//!  ┌────────────────────────┐
//!  │  ConfirmationTracker   │  poll, back off, Confirmed | Failed | Timeout
//!  └────────────────────────┘
//!
//!  TtlCache sits beside the read path (balances), off the write path.
//! ```

// Core subsystems
pub mod amount;
pub mod blockchain;
pub mod confirmation;
pub mod orchestrator;

// Endpoint management
pub mod cache;
pub mod health;
pub mod resilience;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::RuntimeConfig;
pub use error::{Disposition, Error, Result};
pub use lifecycle::CancelToken;
pub use orchestrator::{TransactionOrchestrator, TransferReceipt, TransferRequest};
