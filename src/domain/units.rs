//! Conversion between human-readable decimal amounts and base units.
//!
//! Config files and API payloads express amounts like `"0.01"`; the ledger
//! only ever sees integer base units.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

use super::types::Amount;

/// Largest supported decimals (rust_decimal carries 28 digits of scale).
pub const MAX_DECIMALS: u32 = 28;

/// Parses `"1.5"` with 18 decimals into `1_500_000_000_000_000_000`.
///
/// Rejects negative values, values with more fractional digits than the
/// asset supports, and values that do not fit.
pub fn parse_units(text: &str, decimals: u32) -> anyhow::Result<Amount> {
    anyhow::ensure!(
        decimals <= MAX_DECIMALS,
        "decimals must be <= {MAX_DECIMALS}, got {decimals}"
    );
    let value = Decimal::from_str(text.trim())
        .map_err(|e| anyhow::anyhow!("invalid amount {text:?}: {e}"))?;
    anyhow::ensure!(!value.is_sign_negative(), "amount {text:?} is negative");

    let scale = Decimal::from_i128_with_scale(10_i128.pow(decimals), 0);
    let scaled = value
        .checked_mul(scale)
        .ok_or_else(|| anyhow::anyhow!("amount {text:?} is too large"))?;
    anyhow::ensure!(
        scaled.fract().is_zero(),
        "amount {text:?} has more than {decimals} decimal places"
    );
    scaled
        .to_u128()
        .ok_or_else(|| anyhow::anyhow!("amount {text:?} does not fit in base units"))
}

/// Formats base units as a normalized decimal string (`"3.9"`).
///
/// Falls back to the raw integer when the value exceeds rust_decimal's
/// 96-bit mantissa.
pub fn format_units(amount: Amount, decimals: u32) -> String {
    i128::try_from(amount)
        .ok()
        .and_then(|raw| Decimal::try_from_i128_with_scale(raw, decimals.min(MAX_DECIMALS)).ok())
        .map_or_else(|| amount.to_string(), |d| d.normalize().to_string())
}
