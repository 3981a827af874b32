//! The settlement waterfall.
//!
//! Distributes a record's final PnL in fixed order: LP base fee, LP profit
//! share, insurance contribution, executor profit, then stake return or
//! slashing. All rounding is floor on distributions, so the executor never
//! receives more than the arithmetic allows.

use mandate_core::math::{mul_bps_floor, BPS_DENOM, SECONDS_PER_YEAR};
use mandate_core::types::{Amount, Bps, Pnl, UnixTime};
use serde::{Deserialize, Serialize};

/// Inputs to the waterfall computation.
#[derive(Debug, Clone)]
pub struct WaterfallParams {
    pub capital_limit: Amount,
    pub base_fee_apr_bps: Bps,
    pub profit_share_bps: Bps,
    pub insurance_fee_bps: Bps,
    pub loss_tolerance_bps: Bps,
    pub staked_amount: Amount,
    /// Seconds between the record's start and the settlement call.
    pub elapsed_secs: UnixTime,
    pub final_pnl: Pnl,
}

/// The committed distribution of a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementBreakdown {
    pub final_pnl: Pnl,
    /// Time-based fee owed to LPs regardless of PnL sign.
    pub lp_base_fee: Amount,
    /// LP share of profit net of the base fee.
    pub lp_profit_share: Amount,
    /// Contribution routed to the insurance fund.
    pub insurance_fee: Amount,
    /// Profit remaining to the executor after steps 1-3.
    pub executor_profit: Amount,
    /// Collateral handed back to the executor.
    pub stake_returned: Amount,
    /// Collateral kept to cover the loss.
    pub stake_slashed: Amount,
}

/// Computes the full waterfall. Pure; commitment is the engine's job.
#[must_use]
pub fn compute_waterfall(params: &WaterfallParams) -> SettlementBreakdown {
    let gross_profit: Amount = params.final_pnl.max(0).unsigned_abs();

    // 1. LP base fee: capital * apr * elapsed / year, floor-rounded, capped
    //    so it can never exceed the capital plus realized profit.
    let elapsed = u128::from(params.elapsed_secs.max(0).unsigned_abs());
    let fee_cap = params.capital_limit.saturating_add(gross_profit);
    let lp_base_fee = params
        .capital_limit
        .saturating_mul(u128::from(params.base_fee_apr_bps))
        .saturating_mul(elapsed)
        / (BPS_DENOM * SECONDS_PER_YEAR.unsigned_abs() as u128);
    let lp_base_fee = lp_base_fee.min(fee_cap);

    // 2-4. Profit splits, each taken from what remains.
    let mut remaining = gross_profit.saturating_sub(lp_base_fee);
    let lp_profit_share = mul_bps_floor(remaining, params.profit_share_bps);
    remaining -= lp_profit_share;
    let insurance_fee = mul_bps_floor(gross_profit, params.insurance_fee_bps).min(remaining);
    remaining -= insurance_fee;
    let executor_profit = remaining;

    // 5. Stake disposition.
    let loss: Amount = (-params.final_pnl).max(0).unsigned_abs();
    let (stake_returned, stake_slashed) =
        dispose_stake(params.staked_amount, loss, params.loss_tolerance_bps);

    SettlementBreakdown {
        final_pnl: params.final_pnl,
        lp_base_fee,
        lp_profit_share,
        insurance_fee,
        executor_profit,
        stake_returned,
        stake_slashed,
    }
}

/// Splits posted collateral into (returned, slashed) for a realized loss.
///
/// Losses within `staked * loss_tolerance_bps / 10000` are forgiven in
/// full; beyond that the slash covers the loss, capped at the stake.
#[must_use]
pub fn dispose_stake(staked: Amount, loss: Amount, loss_tolerance_bps: Bps) -> (Amount, Amount) {
    let tolerance = mul_bps_floor(staked, loss_tolerance_bps);
    if loss <= tolerance {
        return (staked, 0);
    }
    let slashed = loss.min(staked);
    (staked - slashed, slashed)
}
