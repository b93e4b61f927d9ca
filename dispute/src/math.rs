//! Fixed-point share arithmetic.
//!
//! Shares are computed at twelve digits of precision (amount × 10^6) and then
//! truncated to whole loya. The truncated fraction, in millionths of a loya,
//! is returned as dust and carried in a single [`Dust`] accumulator; whole
//! loya that accumulate there are burned. No floating point anywhere.

use crate::error::DisputeError;
use layer_types::{Amount, POWER_REDUCTION};
use serde::{Deserialize, Serialize};

/// One payout: whole loya plus the truncated remainder in millionths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Share {
    pub amount: Amount,
    pub dust: u128,
}

impl Share {
    /// Split a value scaled by `POWER_REDUCTION` into whole units and dust.
    pub fn from_scaled(scaled: u128) -> Self {
        Self {
            amount: Amount::new(scaled / POWER_REDUCTION),
            dust: scaled % POWER_REDUCTION,
        }
    }

    /// Value in millionths of a loya.
    pub fn scaled(&self) -> Result<u128, DisputeError> {
        self.amount
            .raw()
            .checked_mul(POWER_REDUCTION)
            .and_then(|v| v.checked_add(self.dust))
            .ok_or(DisputeError::Arithmetic("share overflow"))
    }
}

/// Carried sub-unit remainder, in millionths of a loya.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dust(u128);

impl Dust {
    pub fn new(millionths: u128) -> Self {
        Self(millionths)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Add a remainder. Returns the whole loya to burn and the dust to carry.
    pub fn fold(self, remainder: u128) -> Result<(Amount, Dust), DisputeError> {
        let total = self
            .0
            .checked_add(remainder)
            .ok_or(DisputeError::Arithmetic("dust overflow"))?;
        Ok((
            Amount::new(total / POWER_REDUCTION),
            Dust(total % POWER_REDUCTION),
        ))
    }
}

fn mul_div(a: u128, b: u128, c: u128, what: &'static str) -> Result<u128, DisputeError> {
    if c == 0 {
        return Err(DisputeError::Arithmetic(what));
    }
    a.checked_mul(b)
        .and_then(|v| v.checked_mul(POWER_REDUCTION))
        .map(|v| v / c)
        .ok_or(DisputeError::Arithmetic(what))
}

/// A payer's refund: their share of the fee pot minus the 5% burn.
///
/// `total_fee_round1` is what all first-round payers contributed and
/// `dispute_fee_total` the pot being returned.
pub fn calculate_refund_amount(
    payer_fee: Amount,
    total_fee_round1: Amount,
    dispute_fee_total: Amount,
) -> Result<Share, DisputeError> {
    let five_percent = dispute_fee_total.raw() / 20;
    let pot = dispute_fee_total.raw() - five_percent;
    let scaled = mul_div(
        payer_fee.raw(),
        pot,
        total_fee_round1.raw(),
        "refund with zero total fee",
    )?;
    Ok(Share::from_scaled(scaled))
}

/// A payer's cut of the reporter's forfeited bond, pro-rata to fee paid.
pub fn calculate_reporter_bond_reward_amount(
    payer_fee: Amount,
    total_fees: Amount,
    reporter_bond: Amount,
) -> Result<Share, DisputeError> {
    let scaled = mul_div(
        payer_fee.raw(),
        reporter_bond.raw(),
        total_fees.raw(),
        "bond reward with zero total fee",
    )?;
    Ok(Share::from_scaled(scaled))
}

/// `part / total` in `POWER_REDUCTION` units, clamped to 1. Zero when `total` is.
pub fn normalized_fraction(part: u128, total: u128) -> Result<u128, DisputeError> {
    if total == 0 {
        return Ok(0);
    }
    part.min(total)
        .checked_mul(POWER_REDUCTION)
        .map(|v| v / total)
        .ok_or(DisputeError::Arithmetic("power normalization overflow"))
}
