//! Wallet management and transaction signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::blockchain::rpc::TxSigner;
use crate::blockchain::types::{SignedPayload, SignerError, UnsignedPayload};
use crate::config::BlockchainConfig;

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "LEDGER_RUNTIME_PRIVATE_KEY";

/// Local signer for legacy value transfers with nonce management.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    nonce: Arc<AtomicU64>,
    /// Encoded bytes and nonce of the most recent signature.
    last_signed: Arc<Mutex<Option<(Vec<u8>, u64)>>>,
    chain_id: u64,
    gas_limit: u64,
    gas_price_wei: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key (with or without `0x`).
    pub fn from_private_key(
        private_key_hex: &str,
        config: &BlockchainConfig,
    ) -> Result<Self, SignerError> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| SignerError::InvalidKey(format!("{e}")))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = config.chain_id,
            "Wallet initialized"
        );

        Ok(Self {
            signer,
            nonce: Arc::new(AtomicU64::new(0)),
            last_signed: Arc::new(Mutex::new(None)),
            chain_id: config.chain_id,
            gas_limit: config.gas_limit,
            gas_price_wei: config.gas_price_wei,
        })
    }

    /// Load the key from `LEDGER_RUNTIME_PRIVATE_KEY`.
    pub fn from_env(config: &BlockchainConfig) -> Result<Self, SignerError> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR)
            .map_err(|_| SignerError::MissingKey(PRIVATE_KEY_ENV_VAR))?;
        Self::from_private_key(&private_key, config)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn get_and_increment_nonce(&self) -> u64 {
        self.nonce.fetch_add(1, Ordering::SeqCst)
    }

    /// Overwrite the local nonce, e.g. after reading the account's count on-chain.
    pub fn set_nonce(&self, nonce: u64) {
        self.nonce.store(nonce, Ordering::SeqCst);
    }

    pub fn current_nonce(&self) -> u64 {
        self.nonce.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TxSigner for Wallet {
    async fn sign(&self, payload: &UnsignedPayload) -> Result<SignedPayload, SignerError> {
        let to: Address = payload.recipient.parse().map_err(|e| {
            SignerError::InvalidPayload(format!("Invalid recipient '{}': {e}", payload.recipient))
        })?;

        let nonce = self.get_and_increment_nonce();
        let request = TransactionRequest::default()
            .with_to(to)
            .with_value(U256::from(payload.amount))
            .with_nonce(nonce)
            .with_chain_id(self.chain_id)
            .with_gas_limit(self.gas_limit)
            .with_gas_price(u128::from(self.gas_price_wei));

        let wallet = EthereumWallet::from(self.signer.clone());
        let envelope = request
            .build(&wallet)
            .await
            .map_err(|e| SignerError::Signing(e.to_string()))?;

        tracing::debug!(
            nonce,
            reference_height = payload.reference.height,
            "Transaction signed"
        );

        let encoded = envelope.encoded_2718();
        *self
            .last_signed
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((encoded.clone(), nonce));

        Ok(SignedPayload(encoded))
    }

    /// Give back the nonce of a refused transaction.
    ///
    /// Only the most recent signature is released, and only while no later
    /// nonce has been handed out.
    async fn on_submit_failed(&self, signed: &SignedPayload) {
        let mut last = self
            .last_signed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let nonce = match last.as_ref() {
            Some((bytes, nonce)) if *bytes == signed.0 => *nonce,
            _ => return,
        };

        if self
            .nonce
            .compare_exchange(nonce + 1, nonce, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *last = None;
            tracing::debug!(nonce, "Nonce released after refused submission");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::LatestReference;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config() -> BlockchainConfig {
        BlockchainConfig {
            chain_id: 31337,
            ..BlockchainConfig::default()
        }
    }

    fn payload(recipient: &str) -> UnsignedPayload {
        UnsignedPayload {
            recipient: recipient.to_string(),
            amount: 18_510_000_000,
            reference: LatestReference {
                height: 100,
                hash: None,
            },
        }
    }

    #[test]
    fn test_wallet_from_private_key() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, &config()).unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(wallet.chain_id(), 31337);
    }

    #[test]
    fn test_wallet_with_0x_prefix() {
        let wallet =
            Wallet::from_private_key(&format!("0x{TEST_PRIVATE_KEY}"), &config()).unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let err = Wallet::from_private_key("invalid_key", &config()).unwrap_err();
        assert!(err.to_string().contains("Invalid private key"));
    }

    #[test]
    fn test_nonce_management() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, &config()).unwrap();

        assert_eq!(wallet.get_and_increment_nonce(), 0);
        assert_eq!(wallet.get_and_increment_nonce(), 1);
        assert_eq!(wallet.current_nonce(), 2);

        wallet.set_nonce(100);
        assert_eq!(wallet.current_nonce(), 100);
    }

    #[tokio::test]
    async fn test_sign_transfer_consumes_nonce() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, &config()).unwrap();

        let first = wallet
            .sign(&payload("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"))
            .await
            .unwrap();
        let second = wallet
            .sign(&payload("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"))
            .await
            .unwrap();

        assert!(!first.as_bytes().is_empty());
        assert_ne!(first, second);
        assert_eq!(wallet.current_nonce(), 2);
    }

    #[tokio::test]
    async fn test_refused_submission_releases_nonce() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, &config()).unwrap();
        let recipient = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

        let signed = wallet.sign(&payload(recipient)).await.unwrap();
        assert_eq!(wallet.current_nonce(), 1);
        wallet.on_submit_failed(&signed).await;
        assert_eq!(wallet.current_nonce(), 0);

        // A second release of the same payload is a no-op
        wallet.on_submit_failed(&signed).await;
        assert_eq!(wallet.current_nonce(), 0);
    }

    #[tokio::test]
    async fn test_release_skipped_once_later_nonce_is_issued() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, &config()).unwrap();
        let recipient = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

        let first = wallet.sign(&payload(recipient)).await.unwrap();
        wallet.sign(&payload(recipient)).await.unwrap();
        wallet.on_submit_failed(&first).await;
        assert_eq!(wallet.current_nonce(), 2);
    }

    #[tokio::test]
    async fn test_sign_rejects_bad_recipient() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, &config()).unwrap();
        let err = wallet.sign(&payload("not-an-address")).await.unwrap_err();
        assert!(matches!(err, SignerError::InvalidPayload(_)));
        assert_eq!(wallet.current_nonce(), 0);
    }
}
