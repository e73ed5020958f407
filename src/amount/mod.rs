//! Fixed-point amount conversion.
//!
//! # Data Flow
//! ```text
//! "12.34" (human units)
//!     → parse.rs (decimal string → source base units, no floats)
//!     → convert.rs (× rate_bps / 10_000, round half to even, rebase decimals)
//!     → target base units (u64)
//! ```
//!
//! # Design Decisions
//! - All arithmetic is checked u64; nothing ever wraps or saturates
//! - Ties round to even so repeated conversions carry no systematic bias
//! - Narrowing decimals truncates; results are not invertible in that direction

pub mod convert;
pub mod parse;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use convert::{convert, BASIS_POINTS_DENOMINATOR};
pub use parse::{format_amount, parse_amount};

/// Errors raised by amount parsing and conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// An arithmetic step would exceed `u64::MAX`.
    #[error("Amount overflow during {stage}")]
    Overflow { stage: &'static str },

    /// The human-readable amount could not be parsed.
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: &'static str },

    /// The exchange rate is unusable.
    #[error("Invalid exchange rate: {0} basis points")]
    InvalidRate(u64),
}

/// Result type for amount operations.
pub type AmountResult<T> = Result<T, AmountError>;

/// Pre-resolved conversion parameters for one token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    /// Exchange rate in basis points (10_000 = 1:1).
    pub rate_bps: u64,
    /// Decimal count of the source token.
    pub source_decimals: u8,
    /// Decimal count of the target token.
    pub target_decimals: u8,
}

impl ConversionRecord {
    /// A 1:1 record between tokens with the same decimals.
    pub fn identity(decimals: u8) -> Self {
        Self {
            rate_bps: BASIS_POINTS_DENOMINATOR,
            source_decimals: decimals,
            target_decimals: decimals,
        }
    }

    /// Convert source base units into target base units.
    pub fn apply(&self, amount: u64) -> AmountResult<u64> {
        convert(amount, self.rate_bps, self.source_decimals, self.target_decimals)
    }

    /// Parse a human amount in source units, then convert it.
    ///
    /// Returns `(source_base_units, target_base_units)`.
    pub fn apply_human(&self, text: &str) -> AmountResult<(u64, u64)> {
        let source = parse_amount(text, self.source_decimals)?;
        let target = self.apply(source)?;
        Ok((source, target))
    }
}
