//! Crate-level error taxonomy.
//!
//! Every subsystem error converts into [`Error`]. Callers branch on
//! [`Error::disposition`] rather than on message text.

use thiserror::Error;

use crate::amount::AmountError;
use crate::blockchain::{RpcError, RpcErrorKind, SignerError, TxId};
use crate::config::validation::ValidationError;
use crate::config::ConfigError;
use crate::confirmation::ConfirmError;
use crate::health::MonitorError;

#[derive(Debug, Error)]
pub enum Error {
    /// The selected endpoint could not serve the call.
    #[error("Endpoint {endpoint} unavailable: {source}")]
    EndpointUnavailable {
        endpoint: String,
        #[source]
        source: RpcError,
    },

    /// The provider asked us to slow down.
    #[error("Rate limited by {endpoint}: {message}")]
    RateLimited { endpoint: String, message: String },

    /// Submitted but not observed as final. The transaction may still land.
    #[error("Transaction {tx_id} not confirmed after {attempts} polls")]
    ConfirmationTimeout { tx_id: TxId, attempts: u32 },

    /// Rejected on-chain.
    #[error("Transaction {tx_id} failed: {reason}")]
    OperationFailed { tx_id: TxId, reason: String },

    /// The caller stopped waiting for a submitted transaction.
    #[error("Confirmation of {tx_id} cancelled")]
    Cancelled { tx_id: TxId },

    #[error("Amount overflow during {stage}")]
    AmountOverflow { stage: &'static str },

    #[error("{0}")]
    InvalidAmount(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The endpoint answered but rejected the request.
    #[error(transparent)]
    Rpc(RpcError),

    #[error(transparent)]
    Signing(#[from] SignerError),
}

/// What a caller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Query the identifier again later; do not resubmit yet.
    RecheckLater,
    /// Terminal rejection; resubmitting the same payload will fail again.
    DoNotResubmit,
    /// The input or configuration is wrong.
    FixInput,
    /// Wait longer than the throttle's minimum before the next call.
    BackOff,
    /// Safe to retry; another endpoint may be selected.
    Retry,
    /// The caller gave up.
    Abandoned,
}

impl Error {
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::ConfirmationTimeout { .. } => Disposition::RecheckLater,
            Self::OperationFailed { .. } => Disposition::DoNotResubmit,
            Self::AmountOverflow { .. }
            | Self::InvalidAmount(_)
            | Self::InvalidConfiguration(_)
            | Self::Signing(_) => Disposition::FixInput,
            Self::RateLimited { .. } => Disposition::BackOff,
            Self::EndpointUnavailable { .. } => Disposition::Retry,
            Self::Rpc(e) => match e.kind {
                RpcErrorKind::InsufficientFunds | RpcErrorKind::InvalidRequest => {
                    Disposition::FixInput
                }
                _ => Disposition::Retry,
            },
            Self::Cancelled { .. } => Disposition::Abandoned,
        }
    }

    /// The submitted identifier, when the error happened after submission.
    pub fn tx_id(&self) -> Option<&TxId> {
        match self {
            Self::ConfirmationTimeout { tx_id, .. }
            | Self::OperationFailed { tx_id, .. }
            | Self::Cancelled { tx_id } => Some(tx_id),
            _ => None,
        }
    }
}

impl From<RpcError> for Error {
    fn from(err: RpcError) -> Self {
        match err.kind {
            RpcErrorKind::RateLimited => Self::RateLimited {
                endpoint: err.endpoint,
                message: err.message,
            },
            kind if kind.is_endpoint_fault() => Self::EndpointUnavailable {
                endpoint: err.endpoint.clone(),
                source: err,
            },
            _ => Self::Rpc(err),
        }
    }
}

impl From<ConfirmError> for Error {
    fn from(err: ConfirmError) -> Self {
        match err {
            ConfirmError::Timeout {
                tx_id, attempts, ..
            } => Self::ConfirmationTimeout { tx_id, attempts },
            ConfirmError::Failed { tx_id, reason, .. } => Self::OperationFailed { tx_id, reason },
            ConfirmError::Cancelled { tx_id, .. } => Self::Cancelled { tx_id },
        }
    }
}

impl From<AmountError> for Error {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::Overflow { stage } => Self::AmountOverflow { stage },
            other @ (AmountError::InvalidAmount { .. } | AmountError::InvalidRate(_)) => {
                Self::InvalidAmount(other.to_string())
            }
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}

impl From<MonitorError> for Error {
    fn from(err: MonitorError) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}

impl From<Vec<ValidationError>> for Error {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::InvalidConfiguration(ConfigError::Validation(errors).to_string())
    }
}

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
