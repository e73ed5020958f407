//! Capabilities the runtime consumes from the outside world.
//!
//! Any network client satisfying `LedgerRpc` can be driven by the health
//! monitor, the confirmation tracker and the orchestrator.

use async_trait::async_trait;
use std::sync::Arc;

use crate::blockchain::types::{
    ConfirmationStatus, LatestReference, RpcResult, SignedPayload, SignerError, TxId,
    UnsignedPayload,
};

/// Read and write access to a ledger through one connection.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Cheapest read that proves the endpoint is serving.
    async fn get_latest_reference(&self) -> RpcResult<LatestReference>;

    /// Balance of `account` in base units.
    async fn get_account_balance(&self, account: &str) -> RpcResult<u128>;

    /// Broadcast a signed payload and return its identifier.
    async fn submit(&self, payload: &SignedPayload) -> RpcResult<TxId>;

    async fn get_confirmation_status(&self, tx_id: &TxId) -> RpcResult<ConfirmationStatus>;
}

/// Opens connections to endpoints.
#[async_trait]
pub trait LedgerConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> RpcResult<Arc<dyn LedgerRpc>>;
}

/// Turns an unsigned payload into bytes the ledger accepts.
///
/// The runtime never handles key material itself.
#[async_trait]
pub trait TxSigner: Send + Sync {
    async fn sign(&self, payload: &UnsignedPayload) -> Result<SignedPayload, SignerError>;

    /// Called when the ledger refused `signed`, so any state reserved for it
    /// (such as a sequence number) can be released.
    async fn on_submit_failed(&self, _signed: &SignedPayload) {}
}
