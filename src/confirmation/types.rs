//! Confirmation options, poll history and outcomes.

use serde::Serialize;
use thiserror::Error;

use crate::blockchain::TxId;

// Options share their shape and defaults with the configuration section
pub use crate::config::schema::ConfirmationConfig as ConfirmOptions;

/// What a single poll concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Pending,
    Confirmed,
    Failed,
    Timeout,
    Cancelled,
}

/// One poll in a confirmation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationAttempt {
    /// Zero-based poll index.
    pub attempt_number: u32,
    /// Delay before the next poll, when one follows.
    pub next_delay_ms: Option<u64>,
    pub tx_id: TxId,
    pub outcome: AttemptOutcome,
}

/// A transaction observed as final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub tx_id: TxId,
    pub block: Option<u64>,
    pub attempts: Vec<ConfirmationAttempt>,
}

impl Confirmation {
    /// Number of polls it took.
    pub fn polls(&self) -> u32 {
        self.attempts.len() as u32
    }
}

/// Why a confirmation run ended without a confirmation.
///
/// `Timeout` and `Failed` must never be conflated: a timed-out transaction may
/// still land, a failed one never will.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmError {
    /// Still unknown after every retry. Re-check `tx_id` before resubmitting.
    #[error("Transaction {tx_id} not confirmed after {attempts} polls")]
    Timeout {
        tx_id: TxId,
        attempts: u32,
        history: Vec<ConfirmationAttempt>,
    },

    /// Rejected on-chain. Terminal.
    #[error("Transaction {tx_id} failed: {reason}")]
    Failed {
        tx_id: TxId,
        reason: String,
        history: Vec<ConfirmationAttempt>,
    },

    /// The caller stopped waiting.
    #[error("Confirmation of {tx_id} cancelled")]
    Cancelled {
        tx_id: TxId,
        history: Vec<ConfirmationAttempt>,
    },
}

impl ConfirmError {
    pub fn tx_id(&self) -> &TxId {
        match self {
            Self::Timeout { tx_id, .. }
            | Self::Failed { tx_id, .. }
            | Self::Cancelled { tx_id, .. } => tx_id,
        }
    }

    /// Every attempt recorded before the run ended, the terminal one last.
    pub fn history(&self) -> &[ConfirmationAttempt] {
        match self {
            Self::Timeout { history, .. }
            | Self::Failed { history, .. }
            | Self::Cancelled { history, .. } => history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ConfirmOptions::default();
        assert_eq!(options.max_retries, 40);
        assert_eq!(options.interval_ms, 3000);
        assert_eq!(options.backoff_multiplier, 1.1);
        assert_eq!(options.max_interval_ms, None);
    }

    #[test]
    fn test_error_keeps_identifier() {
        let err = ConfirmError::Timeout {
            tx_id: TxId::from("0xabc"),
            attempts: 3,
            history: Vec::new(),
        };
        assert_eq!(err.tx_id().as_str(), "0xabc");
        assert_eq!(err.to_string(), "Transaction 0xabc not confirmed after 3 polls");
    }
}
