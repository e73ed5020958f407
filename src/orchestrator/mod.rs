//! Top-level entry point composing amounts, routing, throttling and confirmation.

pub mod routed;
pub mod transfer;

pub use routed::RoutedLedger;
pub use transfer::{TransactionOrchestrator, TransferReceipt, TransferRequest};
