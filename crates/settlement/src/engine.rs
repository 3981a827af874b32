//! Commits settlement outcomes across the registry, vault, circuit
//! breaker, and insurance fund.
//!
//! Settlement only ever reduces allocated capital, so it stays available
//! while the breaker is PAUSED; realized losses are reported to the breaker
//! as part of the commit.

use crate::waterfall::{compute_waterfall, SettlementBreakdown, WaterfallParams};
use mandate_core::config::SettlementConfig;
use mandate_core::error::{MandateError, Result};
use mandate_core::types::{Pnl, RightsId, Role, UnixTime};
use mandate_registry::RightsRegistry;
use mandate_risk::CircuitBreaker;
use mandate_vault::{CapitalVault, InsuranceFund};

/// Terminal-state settlement of rights records.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    config: SettlementConfig,
}

impl SettlementEngine {
    #[must_use]
    pub const fn new(config: SettlementConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Settles an ACTIVE record with an externally computed final PnL.
    /// Settlement authority only.
    ///
    /// # Errors
    /// `Unauthorized` for other callers; `RightsNotFound`/`RightsNotActive`
    /// for missing or already-terminal records (re-settling always fails).
    #[allow(clippy::too_many_arguments)]
    pub fn settle(
        &self,
        caller: Role,
        registry: &mut RightsRegistry,
        vault: &mut CapitalVault,
        breaker: &mut CircuitBreaker,
        insurance: &mut InsuranceFund,
        id: RightsId,
        final_pnl: Pnl,
        now: UnixTime,
    ) -> Result<SettlementBreakdown> {
        if caller != Role::SettlementAuthority {
            return Err(MandateError::unauthorized("SettlementAuthority"));
        }
        self.settle_inner(registry, vault, breaker, insurance, id, final_pnl, now)
    }

    /// Settles an expired-but-unmarked record. Callable by anyone; the
    /// final PnL is the record's running realized + unrealized status.
    ///
    /// # Errors
    /// `RightsNotExpired` before the record's expiry;
    /// `RightsNotFound`/`RightsNotActive` for missing or terminal records.
    pub fn force_settle(
        &self,
        registry: &mut RightsRegistry,
        vault: &mut CapitalVault,
        breaker: &mut CircuitBreaker,
        insurance: &mut InsuranceFund,
        id: RightsId,
        now: UnixTime,
    ) -> Result<SettlementBreakdown> {
        let record = registry
            .get(id)
            .ok_or(MandateError::RightsNotFound { id })?;
        if !record.is_active() {
            return Err(MandateError::RightsNotActive { id });
        }
        if !record.is_expired(now) {
            return Err(MandateError::RightsNotExpired { id });
        }
        let final_pnl = record.status.realized_pnl + record.status.unrealized_pnl;
        self.settle_inner(registry, vault, breaker, insurance, id, final_pnl, now)
    }

    #[allow(clippy::too_many_arguments)]
    fn settle_inner(
        &self,
        registry: &mut RightsRegistry,
        vault: &mut CapitalVault,
        breaker: &mut CircuitBreaker,
        insurance: &mut InsuranceFund,
        id: RightsId,
        final_pnl: Pnl,
        now: UnixTime,
    ) -> Result<SettlementBreakdown> {
        let record = registry
            .get(id)
            .ok_or(MandateError::RightsNotFound { id })?;
        if !record.is_active() {
            return Err(MandateError::RightsNotActive { id });
        }

        let breakdown = compute_waterfall(&WaterfallParams {
            capital_limit: record.capital_limit,
            base_fee_apr_bps: record.fees.base_fee_apr_bps,
            profit_share_bps: record.fees.profit_share_bps,
            insurance_fee_bps: self.config.insurance_fee_bps,
            loss_tolerance_bps: self.config.loss_tolerance_bps,
            staked_amount: record.fees.staked_amount,
            elapsed_secs: now.saturating_sub(record.start_time),
            final_pnl,
        });

        // Commit. The record was verified ACTIVE above and this call holds
        // exclusive access, so the transition below cannot fail.
        vault.release(id);
        vault.apply_pnl(final_pnl);

        // Slashed stake covers the LP shortfall; whatever the stake could
        // not absorb falls to the insurance fund, up to its balance.
        vault.credit(breakdown.stake_slashed);
        let loss = (-final_pnl).max(0).unsigned_abs();
        let uncovered = loss.saturating_sub(breakdown.stake_slashed);
        if uncovered > 0 {
            let covered = insurance.cover_shortfall(uncovered);
            vault.credit(covered);
        }

        // Payouts leave the pool: executor profit and the insurance cut.
        vault.debit(breakdown.executor_profit)?;
        vault.debit(breakdown.insurance_fee)?;
        insurance.record_contribution(breakdown.insurance_fee);

        if loss > 0 {
            breaker.record_loss(loss, vault.total_assets(), now);
        }

        registry.complete_settlement(Role::SettlementAuthority, id, final_pnl)?;
        tracing::info!(
            "{} settled: pnl {}, base fee {}, lp share {}, insurance {}, executor {}, slashed {}",
            id,
            final_pnl,
            breakdown.lp_base_fee,
            breakdown.lp_profit_share,
            breakdown.insurance_fee,
            breakdown.executor_profit,
            breakdown.stake_slashed
        );
        Ok(breakdown)
    }
}
