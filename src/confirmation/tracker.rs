//! Bounded confirmation polling.
//!
//! # Algorithm
//! ```text
//! poll status
//!   Confirmed               → Ok(Confirmation)
//!   Failed(reason)          → Err(Failed), no retry
//!   Pending, retries left   → sleep(delay), delay *= multiplier, poll again
//!   Pending, none left      → Err(Timeout { tx_id })
//! ```
//!
//! # Design Decisions
//! - RPC errors while polling count as "not yet observed" and use up a retry
//! - Polls are strictly sequential within one run
//! - Cancellation interrupts both the poll and the sleep

use std::future::Future;

use crate::blockchain::{ConfirmationStatus, LedgerRpc, TxId};
use crate::config::validation::{validate_confirmation, ValidationError};
use crate::confirmation::types::{
    AttemptOutcome, Confirmation, ConfirmationAttempt, ConfirmError, ConfirmOptions,
};
use crate::lifecycle::CancelToken;
use crate::observability::metrics;
use crate::resilience::BackoffSchedule;

#[derive(Debug, Clone)]
pub struct ConfirmationTracker {
    options: ConfirmOptions,
}

impl ConfirmationTracker {
    pub fn new(options: ConfirmOptions) -> Result<Self, Vec<ValidationError>> {
        let errors = validate_confirmation(&options);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &ConfirmOptions {
        &self.options
    }

    /// Poll `source` until `tx_id` is final, failed, or retries run out.
    pub async fn confirm(
        &self,
        tx_id: &TxId,
        source: &dyn LedgerRpc,
        cancel: Option<&CancelToken>,
    ) -> Result<Confirmation, ConfirmError> {
        let mut schedule = BackoffSchedule::new(
            self.options.interval_ms,
            self.options.backoff_multiplier,
            self.options.max_interval_ms,
        );
        let mut attempts: Vec<ConfirmationAttempt> = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            let Some(polled) = until_cancelled(cancel, source.get_confirmation_status(tx_id)).await
            else {
                return Err(self.cancelled(tx_id, attempt, attempts));
            };

            let status = polled.unwrap_or_else(|e| {
                tracing::warn!(tx_id = %tx_id, attempt, error = %e, "Confirmation poll failed, treating as pending");
                ConfirmationStatus::Pending
            });

            match status {
                ConfirmationStatus::Confirmed { block } => {
                    attempts.push(record(tx_id, attempt, None, AttemptOutcome::Confirmed));
                    tracing::info!(tx_id = %tx_id, polls = attempt + 1, block = ?block, "Transaction confirmed");
                    metrics::record_confirmation("confirmed", attempt + 1);
                    return Ok(Confirmation {
                        tx_id: tx_id.clone(),
                        block,
                        attempts,
                    });
                }
                ConfirmationStatus::Failed(reason) => {
                    attempts.push(record(tx_id, attempt, None, AttemptOutcome::Failed));
                    tracing::warn!(tx_id = %tx_id, reason = %reason, "Transaction failed on-chain");
                    metrics::record_confirmation("failed", attempt + 1);
                    return Err(ConfirmError::Failed {
                        tx_id: tx_id.clone(),
                        reason,
                        history: attempts,
                    });
                }
                ConfirmationStatus::Pending if attempt < self.options.max_retries => {
                    let delay = schedule.advance();
                    attempts.push(record(
                        tx_id,
                        attempt,
                        Some(delay.as_millis() as u64),
                        AttemptOutcome::Pending,
                    ));
                    tracing::debug!(
                        tx_id = %tx_id,
                        attempt,
                        next_delay_ms = delay.as_millis() as u64,
                        "Transaction pending"
                    );

                    if until_cancelled(cancel, tokio::time::sleep(delay)).await.is_none() {
                        return Err(self.cancelled(tx_id, attempt + 1, attempts));
                    }
                    attempt += 1;
                }
                ConfirmationStatus::Pending => {
                    let polls = attempt + 1;
                    attempts.push(record(tx_id, attempt, None, AttemptOutcome::Timeout));
                    tracing::warn!(
                        tx_id = %tx_id,
                        polls,
                        "Confirmation timed out; transaction may still land"
                    );
                    metrics::record_confirmation("timeout", polls);
                    return Err(ConfirmError::Timeout {
                        tx_id: tx_id.clone(),
                        attempts: polls,
                        history: attempts,
                    });
                }
            }
        }
    }

    /// `polls` is also the number of the attempt that was interrupted.
    fn cancelled(
        &self,
        tx_id: &TxId,
        polls: u32,
        mut history: Vec<ConfirmationAttempt>,
    ) -> ConfirmError {
        tracing::info!(tx_id = %tx_id, polls, "Confirmation cancelled");
        metrics::record_confirmation("cancelled", polls);
        history.push(record(tx_id, polls, None, AttemptOutcome::Cancelled));
        ConfirmError::Cancelled {
            tx_id: tx_id.clone(),
            history,
        }
    }
}

impl Default for ConfirmationTracker {
    fn default() -> Self {
        Self {
            options: ConfirmOptions::default(),
        }
    }
}

fn record(
    tx_id: &TxId,
    attempt_number: u32,
    next_delay_ms: Option<u64>,
    outcome: AttemptOutcome,
) -> ConfirmationAttempt {
    ConfirmationAttempt {
        attempt_number,
        next_delay_ms,
        tx_id: tx_id.clone(),
        outcome,
    }
}

/// Run `fut` unless `cancel` fires first. `None` means cancelled.
async fn until_cancelled<F: Future>(cancel: Option<&CancelToken>, fut: F) -> Option<F::Output> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            out = fut => Some(out),
        },
        None => Some(fut.await),
    }
}
