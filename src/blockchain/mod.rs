//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! rpc.rs (capability traits: LedgerRpc, LedgerConnector, TxSigner)
//!     ← client.rs (alloy HTTP provider, per-call timeout, error classification)
//!     ← wallet.rs (env-loaded key, local nonce, EIP-2718 encoding)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or signed bytes
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod rpc;
pub mod types;
pub mod wallet;

pub use client::{AlloyConnector, AlloyLedger};
pub use rpc::{LedgerConnector, LedgerRpc, TxSigner};
pub use types::{
    ConfirmationStatus, LatestReference, RpcError, RpcErrorKind, RpcResult, SignedPayload,
    SignerError, TxId, UnsignedPayload,
};
pub use wallet::Wallet;
