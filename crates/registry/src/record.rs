//! The execution-rights record: a time-boxed, capital-bounded claim against
//! the pooled ledger, with its risk constraints, fee terms, and running
//! performance status.

use mandate_core::math::BPS_DENOM;
use mandate_core::types::{Amount, Bps, LifecycleState, Pnl, RightsId, UnixTime};
use serde::{Deserialize, Serialize};

/// Risk constraints fixed at mint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RightsConstraints {
    /// Maximum leverage multiplier.
    pub max_leverage: u32,
    /// Drawdown ceiling for this record, measured against the high-water
    /// mark. Breaching it makes the record liquidatable.
    pub max_drawdown_bps: Bps,
    /// Largest single draw, as bps of the capital limit.
    pub max_position_size_bps: Bps,
    /// Adapters the record may deploy through. Empty means unrestricted.
    pub allowed_adapters: Vec<String>,
    /// Assets the record may draw against. Empty means unrestricted.
    pub allowed_assets: Vec<String>,
}

impl RightsConstraints {
    #[must_use]
    pub fn allows_asset(&self, asset: &str) -> bool {
        self.allowed_assets.is_empty() || self.allowed_assets.iter().any(|a| a == asset)
    }

    #[must_use]
    pub fn allows_adapter(&self, adapter: &str) -> bool {
        self.allowed_adapters.is_empty() || self.allowed_adapters.iter().any(|a| a == adapter)
    }
}

/// Fee terms and posted collateral, fixed at mint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeTerms {
    /// Time-based base fee owed to LPs, as APR bps on the capital limit.
    pub base_fee_apr_bps: Bps,
    /// LP share of settlement profit.
    pub profit_share_bps: Bps,
    /// Collateral posted by the executor.
    pub staked_amount: Amount,
}

/// Running performance status, updated only by the allocation controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RightsStatus {
    /// Capital currently drawn and deployed.
    pub capital_deployed: Amount,
    pub realized_pnl: Pnl,
    pub unrealized_pnl: Pnl,
    /// Highest total value reached. Starts at the capital limit and never
    /// decreases.
    pub high_water_mark: Amount,
    /// Worst drawdown seen, in bps of the capital limit, measured against
    /// the high-water mark. Never decreases.
    pub max_drawdown_hit_bps: u128,
}

/// One execution-rights record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RightsRecord {
    pub id: RightsId,
    pub executor: String,
    pub capital_limit: Amount,
    pub start_time: UnixTime,
    pub expiry_time: UnixTime,
    pub constraints: RightsConstraints,
    pub fees: FeeTerms,
    pub status: RightsStatus,
    pub lifecycle_state: LifecycleState,
}

impl RightsRecord {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.lifecycle_state, LifecycleState::Active)
    }

    /// Pure time predicate: has the record's window elapsed?
    #[must_use]
    pub const fn is_expired(&self, now: UnixTime) -> bool {
        now >= self.expiry_time
    }

    /// Capital-limit headroom left for further draws.
    #[must_use]
    pub fn remaining_capital(&self) -> Amount {
        self.capital_limit
            .saturating_sub(self.status.capital_deployed)
    }

    /// Capital limit plus running PnL. May go negative on heavy losses.
    #[must_use]
    pub fn current_total_value(&self) -> Pnl {
        let base = Pnl::try_from(self.capital_limit).unwrap_or(Pnl::MAX);
        base + self.status.realized_pnl + self.status.unrealized_pnl
    }

    /// Applies status deltas and rolls the high-water mark and max-drawdown
    /// trackers forward.
    ///
    /// Drawdown is measured against the high-water mark rather than the
    /// original capital, so a record that has profited and then given back
    /// gains is still tracked correctly.
    pub fn apply_status_deltas(
        &mut self,
        deployed_delta: Pnl,
        realized_pnl_delta: Pnl,
        unrealized_pnl_delta: Pnl,
    ) {
        if deployed_delta >= 0 {
            self.status.capital_deployed = self
                .status
                .capital_deployed
                .saturating_add(deployed_delta.unsigned_abs());
        } else {
            self.status.capital_deployed = self
                .status
                .capital_deployed
                .saturating_sub(deployed_delta.unsigned_abs());
        }
        self.status.realized_pnl += realized_pnl_delta;
        self.status.unrealized_pnl += unrealized_pnl_delta;

        let total_value = self.current_total_value();
        if total_value > 0 {
            let total_value = total_value.unsigned_abs();
            if total_value > self.status.high_water_mark {
                self.status.high_water_mark = total_value;
            }
        }

        if self.capital_limit > 0 {
            let hwm = Pnl::try_from(self.status.high_water_mark).unwrap_or(Pnl::MAX);
            let below_mark = hwm.saturating_sub(total_value).max(0).unsigned_abs();
            let drawdown_bps = below_mark.saturating_mul(BPS_DENOM) / self.capital_limit;
            if drawdown_bps > self.status.max_drawdown_hit_bps {
                self.status.max_drawdown_hit_bps = drawdown_bps;
            }
        }
    }

    /// True once the worst observed drawdown breaches the record's own
    /// constraint.
    #[must_use]
    pub fn drawdown_breached(&self) -> bool {
        self.status.max_drawdown_hit_bps > u128::from(self.constraints.max_drawdown_bps)
    }
}
