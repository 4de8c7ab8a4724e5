//! Pari-mutuel fee and payout arithmetic.
//!
//! All math is integer floor division on `u128` base units; the payout
//! product is widened to `U256` before dividing. Truncation is
//! part of the contract: dust left over from even splits and from payout
//! division is never redistributed.
//!
//! - Fee: `pool * bps / 10_000`
//! - Pool after fee: `pool - fee`
//! - Winnings: `stake * pool_after_fee / winning_side_stake`

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};
use super::types::{Amount, BPS_DENOMINATOR, MAX_FEE_BPS};

/// Platform fee rate, capped at [`MAX_FEE_BPS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct FeeSchedule {
    bps: u16,
}

impl FeeSchedule {
    /// Creates a fee schedule, rejecting rates above the 10% cap.
    pub fn new(bps: u16) -> LedgerResult<Self> {
        if bps > MAX_FEE_BPS {
            return Err(LedgerError::FeeTooHigh { bps, max: MAX_FEE_BPS });
        }
        Ok(Self { bps })
    }

    pub const fn bps(self) -> u16 {
        self.bps
    }

    /// Fee taken from a pool of the given size.
    pub fn fee_on(self, pool: Amount) -> LedgerResult<Amount> {
        pool.checked_mul(Amount::from(self.bps))
            .map(|scaled| scaled / BPS_DENOMINATOR)
            .ok_or(LedgerError::Overflow)
    }

    /// Pool left for winners once the fee is removed.
    pub fn net_of_fee(self, pool: Amount) -> LedgerResult<Amount> {
        Ok(pool - self.fee_on(pool)?)
    }
}

impl Default for FeeSchedule {
    /// 2.5%.
    fn default() -> Self {
        Self { bps: 250 }
    }
}

impl TryFrom<u16> for FeeSchedule {
    type Error = LedgerError;

    fn try_from(bps: u16) -> LedgerResult<Self> {
        Self::new(bps)
    }
}

impl From<FeeSchedule> for u16 {
    fn from(schedule: FeeSchedule) -> Self {
        schedule.bps
    }
}

/// Outcome of spreading a value evenly across `n` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvenSplit {
    /// Credited to each option.
    pub per_option: Amount,
    /// `per_option * n`; the only part that enters the pool.
    pub distributed: Amount,
    /// Division remainder; never credited anywhere.
    pub stranded: Amount,
}

/// Splits `value` across `options` by floor division.
///
/// The remainder is reported as `stranded` and must not be added to the
/// pool.
pub fn split_evenly(value: Amount, options: usize) -> EvenSplit {
    if options == 0 {
        return EvenSplit {
            per_option: 0,
            distributed: 0,
            stranded: value,
        };
    }
    let n = options as Amount;
    let per_option = value / n;
    let distributed = per_option * n;
    EvenSplit {
        per_option,
        distributed,
        stranded: value - distributed,
    }
}

/// A winner's share of the post-fee pool.
///
/// `winning_stake` is the single winning option's total, or the sum over
/// the tied set. A zero denominator pays nothing. `stake * pool_after_fee`
/// routinely exceeds `u128` at 18 decimals, so the product is taken in
/// `U256`; the quotient fits back whenever `stake <= winning_stake`.
pub fn winnings(
    stake: Amount,
    pool_after_fee: Amount,
    winning_stake: Amount,
) -> LedgerResult<Amount> {
    if winning_stake == 0 {
        return Ok(0);
    }
    let scaled = U256::from(stake) * U256::from(pool_after_fee);
    Amount::try_from(scaled / U256::from(winning_stake)).map_err(|_| LedgerError::Overflow)
}
