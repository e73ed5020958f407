//! Basis-point conversion with banker's rounding.

use crate::amount::{AmountError, AmountResult};

/// One whole unit of rate, in basis points.
pub const BASIS_POINTS_DENOMINATOR: u64 = 10_000;

/// Convert `amount` (source base units) to target base units.
///
/// # Arguments
/// * `amount` - Amount in the source token's smallest unit
/// * `rate_bps` - Exchange rate in basis points (15_000 = 1.5x)
/// * `source_decimals` - Decimal count of the source token
/// * `target_decimals` - Decimal count of the target token
///
/// # Errors
/// `AmountError::Overflow` if the rate product or the decimal rescale would
/// exceed `u64::MAX`. `AmountError::InvalidRate` for a zero rate.
pub fn convert(
    amount: u64,
    rate_bps: u64,
    source_decimals: u8,
    target_decimals: u8,
) -> AmountResult<u64> {
    if rate_bps == 0 {
        return Err(AmountError::InvalidRate(rate_bps));
    }

    let numerator = amount
        .checked_mul(rate_bps)
        .ok_or(AmountError::Overflow { stage: "rate multiplication" })?;

    let rounded = round_half_even(numerator, BASIS_POINTS_DENOMINATOR);
    rescale(rounded, source_decimals, target_decimals)
}

/// Divide with round-half-to-even on the remainder.
fn round_half_even(numerator: u64, denominator: u64) -> u64 {
    let quotient = numerator / denominator;
    let twice_remainder = (numerator % denominator) * 2;

    // quotient <= u64::MAX / denominator, so quotient + 1 cannot overflow
    if twice_remainder > denominator {
        quotient + 1
    } else if twice_remainder == denominator && quotient % 2 == 1 {
        quotient + 1
    } else {
        quotient
    }
}

/// Move `value` from `source` decimals to `target` decimals.
fn rescale(value: u64, source: u8, target: u8) -> AmountResult<u64> {
    use std::cmp::Ordering;

    match target.cmp(&source) {
        Ordering::Equal => Ok(value),
        Ordering::Greater => {
            let factor = 10u64
                .checked_pow(u32::from(target - source))
                .ok_or(AmountError::Overflow { stage: "decimal scaling" })?;
            value
                .checked_mul(factor)
                .ok_or(AmountError::Overflow { stage: "decimal scaling" })
        }
        // 10^20 exceeds any u64, so a wider gap always truncates to zero
        Ordering::Less => Ok(10u64
            .checked_pow(u32::from(source - target))
            .map_or(0, |factor| value / factor)),
    }
}
