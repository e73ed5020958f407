//! Health-routed, throttled ledger access.
//!
//! # Responsibilities
//! - Ask the monitor which endpoint to use for every call
//! - Reuse one connection per endpoint
//! - Pass every call through the shared throttle
//! - Feed call outcomes back into endpoint health

use async_trait::async_trait;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

use crate::blockchain::{
    ConfirmationStatus, LatestReference, LedgerConnector, LedgerRpc, RpcResult, SignedPayload,
    TxId,
};
use crate::health::EndpointHealthMonitor;
use crate::resilience::Throttle;

pub struct RoutedLedger {
    monitor: Arc<EndpointHealthMonitor>,
    connector: Arc<dyn LedgerConnector>,
    throttle: Arc<Throttle>,
    connections: DashMap<String, Arc<dyn LedgerRpc>>,
}

impl RoutedLedger {
    pub fn new(
        monitor: Arc<EndpointHealthMonitor>,
        connector: Arc<dyn LedgerConnector>,
        throttle: Arc<Throttle>,
    ) -> Self {
        Self {
            monitor,
            connector,
            throttle,
            connections: DashMap::new(),
        }
    }

    pub fn monitor(&self) -> &Arc<EndpointHealthMonitor> {
        &self.monitor
    }

    async fn connection(&self, endpoint: &str) -> RpcResult<Arc<dyn LedgerRpc>> {
        if let Some(existing) = self.connections.get(endpoint) {
            return Ok(existing.clone());
        }
        let fresh = self.connector.connect(endpoint).await?;
        self.connections.insert(endpoint.to_string(), fresh.clone());
        Ok(fresh)
    }

    async fn route<T, F, Fut>(&self, method: &'static str, call: F) -> RpcResult<T>
    where
        F: FnOnce(Arc<dyn LedgerRpc>) -> Fut,
        Fut: Future<Output = RpcResult<T>>,
    {
        let endpoint = self.monitor.get_healthy_endpoint();
        self.throttle.wait().await;

        let rpc = match self.connection(&endpoint).await {
            Ok(rpc) => rpc,
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Failed to connect");
                self.monitor.report_error(&endpoint, &e);
                return Err(e);
            }
        };

        let started = Instant::now();
        let result = call(rpc).await;
        let latency = started.elapsed();

        match &result {
            Err(e) if e.is_endpoint_fault() => {
                tracing::warn!(endpoint = %endpoint, method, error = %e, "RPC call failed");
                self.monitor.report_error(&endpoint, e);
                self.connections.remove(&endpoint);
            }
            Err(e) => {
                // The endpoint answered; the request itself was rejected
                tracing::debug!(endpoint = %endpoint, method, error = %e, "RPC call rejected");
                self.monitor.report_success(&endpoint, Some(latency));
            }
            Ok(_) => {
                tracing::trace!(endpoint = %endpoint, method, latency_ms = latency.as_millis() as u64, "RPC call succeeded");
                self.monitor.report_success(&endpoint, Some(latency));
            }
        }
        result
    }
}

#[async_trait]
impl LedgerRpc for RoutedLedger {
    async fn get_latest_reference(&self) -> RpcResult<LatestReference> {
        self.route("get_latest_reference", |rpc| async move {
            rpc.get_latest_reference().await
        })
        .await
    }

    async fn get_account_balance(&self, account: &str) -> RpcResult<u128> {
        self.route("get_account_balance", |rpc| async move {
            rpc.get_account_balance(account).await
        })
        .await
    }

    async fn submit(&self, payload: &SignedPayload) -> RpcResult<TxId> {
        self.route("submit", |rpc| async move { rpc.submit(payload).await })
            .await
    }

    async fn get_confirmation_status(&self, tx_id: &TxId) -> RpcResult<ConfirmationStatus> {
        self.route("get_confirmation_status", |rpc| async move {
            rpc.get_confirmation_status(tx_id).await
        })
        .await
    }
}

impl std::fmt::Debug for RoutedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutedLedger")
            .field("monitor", &self.monitor)
            .field("connections", &self.connections.len())
            .finish()
    }
}
