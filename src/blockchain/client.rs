//! alloy-backed ledger client with timeout and error classification.
//!
//! # Responsibilities
//! - Connect to one JSON-RPC endpoint
//! - Query chain state (block number, balances, receipts)
//! - Bound every call with a timeout
//! - Translate transport and JSON-RPC failures into `RpcErrorKind`

use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::{RpcError as TransportRpcError, TransportError, TransportErrorKind};
use async_trait::async_trait;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::rpc::{LedgerConnector, LedgerRpc};
use crate::blockchain::types::{
    ConfirmationStatus, LatestReference, RpcError, RpcErrorKind, RpcResult, SignedPayload, TxId,
};
use crate::config::BlockchainConfig;
use crate::observability::metrics;

/// A `LedgerRpc` over one alloy HTTP provider.
#[derive(Clone)]
pub struct AlloyLedger {
    endpoint: String,
    provider: DynProvider,
    timeout_duration: Duration,
}

impl AlloyLedger {
    /// Build a client for `endpoint`. No request is made until first use.
    pub fn connect(endpoint: &str, timeout_duration: Duration) -> RpcResult<Self> {
        let url: url::Url = endpoint.parse().map_err(|e| {
            RpcError::new(
                RpcErrorKind::InvalidRequest,
                endpoint,
                format!("Invalid RPC URL: {e}"),
            )
        })?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self {
            endpoint: endpoint.to_string(),
            provider,
            timeout_duration,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Chain ID reported by the endpoint.
    pub async fn chain_id(&self) -> RpcResult<u64> {
        self.call("eth_chainId", self.provider.get_chain_id()).await
    }

    /// Next nonce for `address`, used to seed a signer's local counter.
    pub async fn transaction_count(&self, address: Address) -> RpcResult<u64> {
        self.call(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address),
        )
        .await
    }

    async fn call<T, F>(&self, method: &'static str, request: F) -> RpcResult<T>
    where
        F: IntoFuture<Output = Result<T, TransportError>>,
    {
        let started = tokio::time::Instant::now();
        let result = match timeout(self.timeout_duration, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify_transport_error(&self.endpoint, &e)),
            Err(_) => Err(RpcError::new(
                RpcErrorKind::Timeout,
                &self.endpoint,
                format!(
                    "{method} timed out after {}ms",
                    self.timeout_duration.as_millis()
                ),
            )),
        };

        metrics::record_rpc_call(&self.endpoint, method, result.is_ok(), started.elapsed());
        if let Err(e) = &result {
            tracing::debug!(endpoint = %self.endpoint, method, error = %e, "RPC call failed");
        }
        result
    }

    fn parse_address(&self, account: &str) -> RpcResult<Address> {
        account.parse().map_err(|e| {
            RpcError::new(
                RpcErrorKind::InvalidRequest,
                &self.endpoint,
                format!("Invalid address '{account}': {e}"),
            )
        })
    }
}

#[async_trait]
impl LedgerRpc for AlloyLedger {
    async fn get_latest_reference(&self) -> RpcResult<LatestReference> {
        let height = self
            .call("eth_blockNumber", self.provider.get_block_number())
            .await?;
        Ok(LatestReference { height, hash: None })
    }

    async fn get_account_balance(&self, account: &str) -> RpcResult<u128> {
        let address = self.parse_address(account)?;
        let balance = self
            .call("eth_getBalance", self.provider.get_balance(address))
            .await?;
        u128::try_from(balance).map_err(|_| {
            RpcError::new(
                RpcErrorKind::Other,
                &self.endpoint,
                format!("Balance of {account} does not fit in 128 bits"),
            )
        })
    }

    async fn submit(&self, payload: &SignedPayload) -> RpcResult<TxId> {
        let pending = self
            .call(
                "eth_sendRawTransaction",
                self.provider.send_raw_transaction(payload.as_bytes()),
            )
            .await?;
        Ok(TxId(pending.tx_hash().to_string()))
    }

    async fn get_confirmation_status(&self, tx_id: &TxId) -> RpcResult<ConfirmationStatus> {
        let hash: TxHash = tx_id.as_str().parse().map_err(|e| {
            RpcError::new(
                RpcErrorKind::InvalidRequest,
                &self.endpoint,
                format!("Invalid transaction hash '{tx_id}': {e}"),
            )
        })?;

        let receipt = self
            .call(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(hash),
            )
            .await?;

        Ok(match receipt {
            None => ConfirmationStatus::Pending,
            Some(r) if r.status() => ConfirmationStatus::Confirmed {
                block: r.block_number,
            },
            Some(_) => ConfirmationStatus::Failed("Transaction reverted".to_string()),
        })
    }
}

impl std::fmt::Debug for AlloyLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyLedger")
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_duration.as_millis())
            .finish()
    }
}

/// Opens `AlloyLedger` connections with a shared call timeout.
#[derive(Debug, Clone)]
pub struct AlloyConnector {
    timeout_duration: Duration,
}

impl AlloyConnector {
    pub fn new(timeout_duration: Duration) -> Self {
        Self { timeout_duration }
    }

    pub fn from_config(config: &BlockchainConfig) -> Self {
        Self::new(config.rpc_timeout())
    }
}

#[async_trait]
impl LedgerConnector for AlloyConnector {
    async fn connect(&self, endpoint: &str) -> RpcResult<Arc<dyn LedgerRpc>> {
        let ledger = AlloyLedger::connect(endpoint, self.timeout_duration)?;
        Ok(Arc::new(ledger))
    }
}

/// Structured codes first; message text only when nothing else is available.
fn classify_transport_error(endpoint: &str, err: &TransportError) -> RpcError {
    let kind = match err {
        TransportRpcError::ErrorResp(payload) => RpcErrorKind::from_code(payload.code)
            .unwrap_or_else(|| RpcErrorKind::classify_message(&payload.message)),
        TransportRpcError::Transport(TransportErrorKind::HttpError(http)) => {
            RpcErrorKind::from_http_status(http.status)
        }
        TransportRpcError::Transport(_) => RpcErrorKind::Transport,
        other => RpcErrorKind::classify_message(&other.to_string()),
    };
    RpcError::new(kind, endpoint, err.to_string())
}
