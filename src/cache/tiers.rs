//! TTL tiers for different kinds of ledger reads.

use std::time::Duration;

use crate::config::CacheTtlConfig;

/// How volatile a cached read is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Raw account info (short).
    AccountInfo,
    /// Balances and supply (medium).
    Balance,
    /// Token metadata (long).
    Metadata,
    /// Quasi-static configuration records (very long).
    ConfigRecord,
}

impl CacheTtlConfig {
    /// TTL configured for `tier`.
    pub fn ttl(&self, tier: CacheTier) -> Duration {
        let ms = match tier {
            CacheTier::AccountInfo => self.account_info_ms,
            CacheTier::Balance => self.balance_ms,
            CacheTier::Metadata => self.metadata_ms,
            CacheTier::ConfigRecord => self.config_record_ms,
        };
        Duration::from_millis(ms)
    }
}
