//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the runtime.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the ledger client runtime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Candidate RPC endpoints; the first one is the primary.
    pub endpoints: Vec<String>,

    /// Endpoint health monitoring.
    pub health_check: HealthCheckConfig,

    /// Confirmation polling.
    pub confirmation: ConfirmationConfig,

    /// Outbound request pacing.
    pub throttle: ThrottleConfig,

    /// Read-path cache TTL tiers.
    pub cache: CacheTtlConfig,

    /// Ledger adapter settings.
    pub blockchain: BlockchainConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["http://localhost:8545".to_string()],
            health_check: HealthCheckConfig::default(),
            confirmation: ConfirmationConfig::default(),
            throttle: ThrottleConfig::default(),
            cache: CacheTtlConfig::default(),
            blockchain: BlockchainConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the periodic probe loop.
    pub enabled: bool,

    /// Probe interval in milliseconds.
    pub interval_ms: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Consecutive errors before an endpoint is marked unhealthy.
    pub max_consecutive_errors: u64,

    /// Latency above which a successful call still marks an endpoint unhealthy.
    pub latency_threshold_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 30_000,
            timeout_ms: 10_000,
            max_consecutive_errors: 3,
            latency_threshold_ms: 5_000,
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn latency_threshold(&self) -> Duration {
        Duration::from_millis(self.latency_threshold_ms)
    }
}

/// Confirmation polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Polls after the first before giving up.
    pub max_retries: u32,

    /// Initial delay between polls in milliseconds.
    pub interval_ms: u64,

    /// Factor applied to the delay after every unsuccessful poll.
    pub backoff_multiplier: f64,

    /// Optional ceiling for the delay in milliseconds.
    pub max_interval_ms: Option<u64>,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            max_retries: 40,
            interval_ms: 3_000,
            backoff_multiplier: 1.1,
            max_interval_ms: None,
        }
    }
}

/// Throttle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum spacing between outbound RPC calls in milliseconds.
    pub min_delay_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self { min_delay_ms: 100 }
    }
}

/// Cache TTL tiers in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheTtlConfig {
    /// Account info reads.
    pub account_info_ms: u64,
    /// Balances and supply.
    pub balance_ms: u64,
    /// Token metadata.
    pub metadata_ms: u64,
    /// Quasi-static configuration records.
    pub config_record_ms: u64,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            account_info_ms: 10_000,
            balance_ms: 30_000,
            metadata_ms: 5 * 60_000,
            config_record_ms: 60 * 60_000,
        }
    }
}

/// Ledger adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// Chain ID used when signing.
    pub chain_id: u64,

    /// RPC request timeout in milliseconds.
    pub rpc_timeout_ms: u64,

    /// Gas limit for transfers.
    pub gas_limit: u64,

    /// Gas price in wei for transfers.
    pub gas_price_wei: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            rpc_timeout_ms: 10_000,
            gas_limit: 21_000,
            gas_price_wei: 1_000_000_000,
        }
    }
}

impl BlockchainConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
