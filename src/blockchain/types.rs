//! Ledger-facing value types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of a submitted transaction (hash or signature).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TxId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TxId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The most recent block/slot reference a payload is anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestReference {
    pub height: u64,
    pub hash: Option<String>,
}

/// What the ledger currently knows about a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationStatus {
    /// Not yet observed as final.
    Pending,
    /// Durably committed.
    Confirmed { block: Option<u64> },
    /// Rejected or reverted on-chain.
    Failed(String),
}

/// A transfer ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedPayload {
    pub recipient: String,
    /// Amount in the ledger's base units.
    pub amount: u64,
    pub reference: LatestReference,
}

/// Opaque signed bytes accepted by `LedgerRpc::submit`.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedPayload(pub Vec<u8>);

impl SignedPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SignedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignedPayload({} bytes)", self.0.len())
    }
}

/// Structured classification of an RPC failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcErrorKind {
    RateLimited,
    Timeout,
    Transport,
    Server,
    InsufficientFunds,
    NotFound,
    InvalidRequest,
    Other,
}

impl RpcErrorKind {
    /// Whether this failure says something about the endpoint itself.
    ///
    /// Application-level rejections (bad input, insufficient funds) mean the
    /// endpoint answered correctly and must not count against its health.
    pub fn is_endpoint_fault(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::Transport | Self::Server
        )
    }

    /// Map a JSON-RPC error code, when it is one we recognize.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            429 | -32005 => Some(Self::RateLimited),
            -32600 | -32601 | -32602 => Some(Self::InvalidRequest),
            -32603 => Some(Self::Server),
            -32001 => Some(Self::NotFound),
            _ => None,
        }
    }

    /// Map an HTTP status returned by the transport.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 | 403 => Self::RateLimited,
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            500..=599 => Self::Server,
            _ => Self::Transport,
        }
    }

    /// Last-resort classification from provider error text.
    ///
    /// Only used at the adapter boundary when no structured code is available.
    pub fn classify_message(message: &str) -> Self {
        let text = message.to_ascii_lowercase();
        if ["insufficient funds", "insufficient balance", "insufficient lamports"]
            .iter()
            .any(|phrase| text.contains(phrase))
        {
            Self::InsufficientFunds
        } else if has_token(&text, "429")
            || has_token(&text, "403")
            || text.contains("rate limit")
            || text.contains("too many requests")
        {
            Self::RateLimited
        } else if text.contains("timeout") || text.contains("timed out") {
            Self::Timeout
        } else if text.contains("connection") || text.contains("dns") {
            Self::Transport
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate limited",
            Self::Timeout => "timeout",
            Self::Transport => "transport error",
            Self::Server => "server error",
            Self::InsufficientFunds => "insufficient funds",
            Self::NotFound => "not found",
            Self::InvalidRequest => "invalid request",
            Self::Other => "rpc error",
        }
    }
}

/// Whether `token` appears as a standalone alphanumeric word in `text`.
fn has_token(text: &str, token: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == token)
}

impl fmt::Display for RpcErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call against one endpoint.
#[derive(Debug, Clone, Error)]
#[error("{kind} from {endpoint}: {message}")]
pub struct RpcError {
    pub kind: RpcErrorKind,
    pub endpoint: String,
    pub message: String,
}

impl RpcError {
    pub fn new(kind: RpcErrorKind, endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn is_endpoint_fault(&self) -> bool {
        self.kind.is_endpoint_fault()
    }
}

/// Result type for ledger RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors raised while producing a signed payload.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Key material missing from the environment.
    #[error("Environment variable {0} not set")]
    MissingKey(&'static str),

    /// Key material present but unparseable.
    #[error("Invalid private key format: {0}")]
    InvalidKey(String),

    /// The payload cannot be expressed as a ledger transaction.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The signing backend failed.
    #[error("Signing failed: {0}")]
    Signing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_message() {
        assert_eq!(
            RpcErrorKind::classify_message("HTTP 429 Too Many Requests"),
            RpcErrorKind::RateLimited
        );
        assert_eq!(
            RpcErrorKind::classify_message("server responded with 403"),
            RpcErrorKind::RateLimited
        );
        assert_eq!(
            RpcErrorKind::classify_message("Rate limit exceeded"),
            RpcErrorKind::RateLimited
        );
        assert_eq!(
            RpcErrorKind::classify_message("request timed out"),
            RpcErrorKind::Timeout
        );
        assert_eq!(
            RpcErrorKind::classify_message("insufficient funds for gas * price + value"),
            RpcErrorKind::InsufficientFunds
        );
        assert_eq!(
            RpcErrorKind::classify_message("Attempt to debit an account but found no record of a prior credit, insufficient lamports"),
            RpcErrorKind::InsufficientFunds
        );
        assert_eq!(
            RpcErrorKind::classify_message("execution reverted"),
            RpcErrorKind::Other
        );
    }

    #[test]
    fn test_status_digits_inside_amounts_are_not_rate_limits() {
        assert_eq!(
            RpcErrorKind::classify_message(
                "insufficient funds for gas * price + value: have 4290000000000 want 21000000000000"
            ),
            RpcErrorKind::InsufficientFunds
        );
        assert_eq!(
            RpcErrorKind::classify_message("nonce too low: next nonce 14030, tx nonce 4031"),
            RpcErrorKind::Other
        );
        assert_eq!(
            RpcErrorKind::classify_message("upstream returned status 429"),
            RpcErrorKind::RateLimited
        );
    }

    #[test]
    fn test_balance_mention_is_not_insufficient_funds() {
        let kind = RpcErrorKind::classify_message("error fetching balance: connection reset by peer");
        assert_eq!(kind, RpcErrorKind::Transport);
        assert!(kind.is_endpoint_fault());
    }

    #[test]
    fn test_codes_take_precedence_over_text() {
        assert_eq!(RpcErrorKind::from_code(-32005), Some(RpcErrorKind::RateLimited));
        assert_eq!(RpcErrorKind::from_code(-32602), Some(RpcErrorKind::InvalidRequest));
        assert_eq!(RpcErrorKind::from_code(-32000), None);
        assert_eq!(RpcErrorKind::from_http_status(429), RpcErrorKind::RateLimited);
        assert_eq!(RpcErrorKind::from_http_status(502), RpcErrorKind::Server);
    }

    #[test]
    fn test_endpoint_fault_split() {
        assert!(RpcErrorKind::RateLimited.is_endpoint_fault());
        assert!(RpcErrorKind::Timeout.is_endpoint_fault());
        assert!(RpcErrorKind::Transport.is_endpoint_fault());
        assert!(RpcErrorKind::Server.is_endpoint_fault());
        assert!(!RpcErrorKind::InsufficientFunds.is_endpoint_fault());
        assert!(!RpcErrorKind::InvalidRequest.is_endpoint_fault());
        assert!(!RpcErrorKind::NotFound.is_endpoint_fault());
    }

    #[test]
    fn test_error_display() {
        let err = RpcError::new(RpcErrorKind::Timeout, "http://a:8545", "get_block_number timed out");
        assert_eq!(
            err.to_string(),
            "timeout from http://a:8545: get_block_number timed out"
        );

        let err = SignerError::MissingKey("LEDGER_RUNTIME_PRIVATE_KEY");
        assert!(err.to_string().contains("LEDGER_RUNTIME_PRIVATE_KEY"));
    }

    #[test]
    fn test_signed_payload_debug_hides_bytes() {
        let payload = SignedPayload(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(format!("{payload:?}"), "SignedPayload(4 bytes)");
    }
}
