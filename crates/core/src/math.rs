//! Integer basis-point arithmetic for the capital ledger.
//!
//! All ledger math is done in smallest units with explicit rounding
//! direction. Hard gates round against the claimant (ceiling), capacity
//! estimates round down (floor); the two must not be symmetrized.

use crate::types::{Amount, Bps, UnixTime};

/// Basis-point denominator: 10000 bps = 100%.
pub const BPS_DENOM: u128 = 10_000;

/// Seconds in one accumulator day window.
pub const SECONDS_PER_DAY: UnixTime = 86_400;

/// Seconds per 365-day year, used for APR fee accrual.
pub const SECONDS_PER_YEAR: UnixTime = 31_536_000;

/// Ceiling division. `denominator` must be non-zero; callers gate degenerate
/// inputs before dividing.
#[must_use]
pub const fn ceil_div(numerator: u128, denominator: u128) -> u128 {
    debug_assert!(denominator != 0);
    let quotient = numerator / denominator;
    if numerator % denominator == 0 {
        quotient
    } else {
        quotient + 1
    }
}

/// `amount * bps / 10000`, floor-rounded.
#[must_use]
pub fn mul_bps_floor(amount: Amount, bps: Bps) -> Amount {
    amount.saturating_mul(u128::from(bps)) / BPS_DENOM
}

/// `amount * bps / 10000`, ceiling-rounded.
#[must_use]
pub fn mul_bps_ceil(amount: Amount, bps: Bps) -> Amount {
    ceil_div(amount.saturating_mul(u128::from(bps)), BPS_DENOM)
}

/// `part / whole` expressed in basis points, ceiling-rounded so a ratio is
/// never understated. `whole` must be non-zero.
#[must_use]
pub fn ratio_bps_ceil(part: Amount, whole: Amount) -> u128 {
    ceil_div(part.saturating_mul(BPS_DENOM), whole)
}

/// Rounds a timestamp down to its day boundary.
#[must_use]
pub const fn day_bucket(ts: UnixTime) -> UnixTime {
    ts.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY
}
