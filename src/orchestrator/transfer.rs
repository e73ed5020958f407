//! Transfer orchestration.
//!
//! # Data Flow
//! ```text
//! TransferRequest { "12.34", recipient, ConversionRecord }
//!     → amount (parse + convert, fail before any network call)
//!     → RoutedLedger::get_latest_reference
//!     → TxSigner::sign
//!     → RoutedLedger::submit
//!     → ConfirmationTracker::confirm (polls through RoutedLedger)
//!     → TransferReceipt | Error
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::amount::ConversionRecord;
use crate::blockchain::{
    LedgerConnector, LedgerRpc, RpcErrorKind, TxId, TxSigner, UnsignedPayload,
};
use crate::cache::{CacheTier, TtlCache};
use crate::config::validation::validate_config;
use crate::config::{CacheTtlConfig, RuntimeConfig};
use crate::confirmation::{Confirmation, ConfirmationTracker};
use crate::error::{Error, Result};
use crate::health::{ConnectorProbe, EndpointHealthMonitor};
use crate::lifecycle::CancelToken;
use crate::orchestrator::routed::RoutedLedger;
use crate::resilience::Throttle;

/// A human-denominated transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Decimal amount in source token units, e.g. `"12.34"`.
    pub amount: String,
    pub recipient: String,
    pub record: ConversionRecord,
}

/// Outcome of a confirmed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub operation_id: Uuid,
    pub tx_id: TxId,
    /// Parsed amount in source base units.
    pub source_amount: u64,
    /// Submitted amount in target base units.
    pub target_amount: u64,
    pub block: Option<u64>,
    /// Confirmation polls it took.
    pub attempts: u32,
}

pub struct TransactionOrchestrator {
    ledger: Arc<RoutedLedger>,
    tracker: ConfirmationTracker,
    signer: Option<Arc<dyn TxSigner>>,
    balances: TtlCache<String, u128>,
}

impl TransactionOrchestrator {
    pub fn new(
        ledger: Arc<RoutedLedger>,
        tracker: ConfirmationTracker,
        cache: &CacheTtlConfig,
    ) -> Self {
        Self {
            ledger,
            tracker,
            signer: None,
            balances: TtlCache::new(cache.ttl(CacheTier::Balance)),
        }
    }

    /// Validate `config` and wire up monitor, throttle and tracker.
    ///
    /// The monitor is created but not started.
    pub fn from_config(config: &RuntimeConfig, connector: Arc<dyn LedgerConnector>) -> Result<Self> {
        validate_config(config)?;

        let probe = Arc::new(ConnectorProbe::new(connector.clone()));
        let monitor = Arc::new(EndpointHealthMonitor::new(
            config.endpoints.clone(),
            config.health_check.clone(),
            probe,
        )?);
        let throttle = Arc::new(Throttle::from_config(&config.throttle));
        let ledger = Arc::new(RoutedLedger::new(monitor, connector, throttle));
        let tracker = ConfirmationTracker::new(config.confirmation.clone())?;

        Ok(Self::new(ledger, tracker, &config.cache))
    }

    pub fn with_signer(mut self, signer: Arc<dyn TxSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn monitor(&self) -> &Arc<EndpointHealthMonitor> {
        self.ledger.monitor()
    }

    pub fn ledger(&self) -> &Arc<RoutedLedger> {
        &self.ledger
    }

    /// Convert, sign, submit and confirm one transfer.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<TransferReceipt> {
        self.execute(request, None).await
    }

    /// As `transfer`, but confirmation stops when `cancel` fires.
    ///
    /// A cancelled transfer has already been submitted; the error carries its id.
    pub async fn transfer_with_cancel(
        &self,
        request: &TransferRequest,
        cancel: &CancelToken,
    ) -> Result<TransferReceipt> {
        self.execute(request, Some(cancel)).await
    }

    /// Poll again for an identifier that previously timed out.
    pub async fn resume_confirmation(
        &self,
        tx_id: &TxId,
        cancel: &CancelToken,
    ) -> Result<Confirmation> {
        tracing::info!(tx_id = %tx_id, "Resuming confirmation");
        let confirmation = self
            .tracker
            .confirm(tx_id, self.ledger.as_ref(), Some(cancel))
            .await?;
        Ok(confirmation)
    }

    /// Balance of `account` in base units, cached for the balance tier TTL.
    pub async fn balance(&self, account: &str) -> Result<u128> {
        let balance = self
            .balances
            .get_or_try_fetch(account.to_string(), None, || {
                self.ledger.get_account_balance(account)
            })
            .await?;
        Ok(balance)
    }

    pub fn balance_ttl(&self) -> Duration {
        self.balances.default_ttl()
    }

    async fn execute(
        &self,
        request: &TransferRequest,
        cancel: Option<&CancelToken>,
    ) -> Result<TransferReceipt> {
        let operation_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "transfer",
            operation_id = %operation_id,
            recipient = %request.recipient
        );

        async move {
            let signer = self.signer.as_ref().ok_or_else(|| {
                Error::InvalidConfiguration("transfer requires a signer".to_string())
            })?;

            let (source_amount, target_amount) = request.record.apply_human(&request.amount)?;
            tracing::debug!(source_amount, target_amount, "Amount converted");

            let reference = self.ledger.get_latest_reference().await?;
            let payload = UnsignedPayload {
                recipient: request.recipient.clone(),
                amount: target_amount,
                reference,
            };
            let signed = signer.sign(&payload).await?;

            let tx_id = match self.ledger.submit(&signed).await {
                Ok(tx_id) => tx_id,
                Err(e) => {
                    // A timed-out broadcast may still land, so its nonce stays spent
                    if e.kind != RpcErrorKind::Timeout {
                        signer.on_submit_failed(&signed).await;
                    }
                    return Err(e.into());
                }
            };
            tracing::info!(tx_id = %tx_id, "Transaction submitted");

            let confirmation = self
                .tracker
                .confirm(&tx_id, self.ledger.as_ref(), cancel)
                .await?;

            self.balances.delete(&request.recipient);

            Ok(TransferReceipt {
                operation_id,
                tx_id,
                source_amount,
                target_amount,
                block: confirmation.block,
                attempts: confirmation.polls(),
            })
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for TransactionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionOrchestrator")
            .field("ledger", &self.ledger)
            .field("has_signer", &self.signer.is_some())
            .finish()
    }
}
