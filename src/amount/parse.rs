//! Decimal string ↔ base unit conversion.
//!
//! Parsing never goes through floating point, so amounts near `u64::MAX`
//! keep every digit.

use crate::amount::{AmountError, AmountResult};

/// Parse a human-readable decimal amount into base units.
///
/// Fractional digits beyond `decimals` are truncated; shorter fractions are
/// zero-padded. `"12.34"` with 6 decimals is `12_340_000`.
pub fn parse_amount(text: &str, decimals: u8) -> AmountResult<u64> {
    let input = text.trim();
    let invalid = |reason| AmountError::InvalidAmount {
        input: text.to_string(),
        reason,
    };

    if input.is_empty() {
        return Err(invalid("empty amount"));
    }
    if input.starts_with('-') {
        return Err(invalid("negative amounts are not allowed"));
    }

    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (input, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("only digits and a single decimal point are allowed"));
    }

    let scale = 10u64
        .checked_pow(u32::from(decimals))
        .ok_or(AmountError::Overflow { stage: "decimal scaling" })?;

    let whole_units = digits_to_u64(whole)?
        .checked_mul(scale)
        .ok_or(AmountError::Overflow { stage: "decimal scaling" })?;

    let kept = &fraction[..fraction.len().min(usize::from(decimals))];
    let padding = u32::from(decimals) - kept.len() as u32;
    // kept has at most `decimals` digits, so padding keeps it below `scale`
    let fraction_units = digits_to_u64(kept)? * 10u64.pow(padding);

    whole_units
        .checked_add(fraction_units)
        .ok_or(AmountError::Overflow { stage: "amount parsing" })
}

/// Render base units as a decimal string, trimming trailing fractional zeros.
pub fn format_amount(base_units: u64, decimals: u8) -> String {
    if decimals == 0 {
        return base_units.to_string();
    }

    let digits = base_units.to_string();
    let width = usize::from(decimals);
    let padded = format!("{digits:0>len$}", len = width + 1);
    let (whole, fraction) = padded.split_at(padded.len() - width);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

fn digits_to_u64(digits: &str) -> AmountResult<u64> {
    digits.bytes().try_fold(0u64, |acc, b| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u64::from(b - b'0')))
            .ok_or(AmountError::Overflow { stage: "amount parsing" })
    })
}
