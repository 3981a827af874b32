//! Pooled capital ledger.
//!
//! Owns the pool balance and the per-rights allocated-capital record, and
//! consults the utilization policy and circuit breaker before honoring
//! allocation or withdrawal requests. Per-asset exposure is the allocation
//! controller's concern; the vault only sees aggregate capital.

use mandate_core::error::{MandateError, Result};
use mandate_core::math::ratio_bps_ceil;
use mandate_core::types::{Amount, Bps, Pnl, RightsId, Role};
use mandate_risk::{CircuitBreaker, UtilizationController};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The capital ledger: total pooled assets plus capital drawn against each
/// active rights record.
///
/// Invariant: `sum(allocated) <= total_assets * max_utilization_bps / 10000`
/// (conservatively rounded) at all times; both gates below preserve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalVault {
    total_assets: Amount,
    allocated: HashMap<RightsId, Amount>,
    total_allocated: Amount,
    utilization: UtilizationController,
}

impl CapitalVault {
    #[must_use]
    pub fn new(utilization: UtilizationController) -> Self {
        Self {
            total_assets: 0,
            allocated: HashMap::new(),
            total_allocated: 0,
            utilization,
        }
    }

    // ==================== Views ====================

    #[must_use]
    pub const fn total_assets(&self) -> Amount {
        self.total_assets
    }

    #[must_use]
    pub const fn total_allocated(&self) -> Amount {
        self.total_allocated
    }

    /// Capital drawn against a rights record. Zero once the record leaves
    /// the ACTIVE state.
    #[must_use]
    pub fn allocated_to(&self, id: RightsId) -> Amount {
        self.allocated.get(&id).copied().unwrap_or(0)
    }

    /// Current pool utilization, ceiling-rounded. Zero for an empty pool.
    #[must_use]
    pub fn utilization_bps(&self) -> u128 {
        if self.total_assets == 0 {
            return 0;
        }
        ratio_bps_ceil(self.total_allocated, self.total_assets)
    }

    /// Capital still allocatable under the utilization cap.
    #[must_use]
    pub fn available_for_allocation(&self) -> Amount {
        self.utilization
            .available_for_allocation(self.total_assets, self.total_allocated)
    }

    /// Pool share held back from allocation by the cap.
    #[must_use]
    pub fn reserve_amount(&self) -> Amount {
        self.utilization.reserve_amount(self.total_assets)
    }

    /// Largest withdrawal the utilization policy will honor right now.
    #[must_use]
    pub fn max_withdrawable(&self) -> Amount {
        self.utilization
            .max_withdrawable(self.total_assets, self.total_allocated)
    }

    #[must_use]
    pub const fn utilization_policy(&self) -> &UtilizationController {
        &self.utilization
    }

    /// Updates the utilization ceiling. Admin-only.
    ///
    /// # Errors
    /// `Unauthorized` for non-admin callers; `InvalidConfig` above 10000 bps.
    pub fn set_max_utilization(&mut self, caller: Role, bps: Bps) -> Result<()> {
        self.utilization.set_max_utilization(caller, bps)
    }

    // ==================== Deposits / Withdrawals ====================

    /// Credits deposited capital to the pool.
    pub fn deposit(&mut self, amount: Amount) {
        self.total_assets = self.total_assets.saturating_add(amount);
        tracing::info!("deposit {} -> total assets {}", amount, self.total_assets);
    }

    /// Withdraws pooled capital, subject to the utilization policy.
    ///
    /// # Errors
    /// `WithdrawalBlocked` if the amount exceeds total assets, would drain
    /// the pool while capital is allocated, or would push utilization over
    /// the cap.
    pub fn withdraw(&mut self, amount: Amount) -> Result<()> {
        if !self
            .utilization
            .can_withdraw(self.total_assets, self.total_allocated, amount)
        {
            return Err(MandateError::withdrawal_blocked(format!(
                "withdrawing {} from {} with {} allocated breaks the utilization policy",
                amount, self.total_assets, self.total_allocated
            )));
        }
        self.total_assets -= amount;
        tracing::info!("withdraw {} -> total assets {}", amount, self.total_assets);
        Ok(())
    }

    // ==================== Allocation ====================

    /// Draws capital against a rights record.
    ///
    /// # Errors
    /// `CircuitBreakerActive` while the breaker is paused;
    /// `UtilizationCapExceeded` if the draw would breach the cap.
    pub fn allocate(
        &mut self,
        id: RightsId,
        amount: Amount,
        breaker: &CircuitBreaker,
    ) -> Result<()> {
        breaker.ensure_not_paused()?;
        if !self
            .utilization
            .can_allocate(self.total_assets, self.total_allocated, amount)
        {
            let proposed = self.total_allocated.saturating_add(amount);
            let would_be_bps = if self.total_assets == 0 {
                u128::from(Bps::MAX)
            } else {
                ratio_bps_ceil(proposed, self.total_assets)
            };
            return Err(MandateError::UtilizationCapExceeded {
                would_be_bps,
                max_bps: self.utilization.max_utilization_bps(),
            });
        }
        *self.allocated.entry(id).or_insert(0) += amount;
        self.total_allocated += amount;
        tracing::info!(
            "allocated {} to {} ({} bps utilization)",
            amount,
            id,
            self.utilization_bps()
        );
        Ok(())
    }

    /// Reverses part of a record's allocation (draw rollback). Clamped to
    /// what is actually allocated.
    pub fn deallocate(&mut self, id: RightsId, amount: Amount) {
        if let Some(allocated) = self.allocated.get_mut(&id) {
            let reversed = amount.min(*allocated);
            *allocated -= reversed;
            self.total_allocated = self.total_allocated.saturating_sub(reversed);
            if *allocated == 0 {
                self.allocated.remove(&id);
            }
        }
    }

    /// Returns a record's drawn capital to the pool bookkeeping and zeroes
    /// its allocation. The returned amount is what had been drawn.
    pub fn release(&mut self, id: RightsId) -> Amount {
        let amount = self.allocated.remove(&id).unwrap_or(0);
        self.total_allocated = self.total_allocated.saturating_sub(amount);
        if amount > 0 {
            tracing::info!("released {} from {}", amount, id);
        }
        amount
    }

    // ==================== Settlement Hooks ====================

    /// Applies a realized PnL to the pool balance. Losses saturate at an
    /// empty pool.
    pub fn apply_pnl(&mut self, pnl: Pnl) {
        if pnl >= 0 {
            self.total_assets = self.total_assets.saturating_add(pnl.unsigned_abs());
        } else {
            self.total_assets = self.total_assets.saturating_sub(pnl.unsigned_abs());
        }
    }

    /// Credits an external amount (slashed stake, insurance payout) to the
    /// pool.
    pub fn credit(&mut self, amount: Amount) {
        self.total_assets = self.total_assets.saturating_add(amount);
    }

    /// Pays an amount out of the pool (executor profit, insurance fee).
    ///
    /// # Errors
    /// `WithdrawalBlocked` if the pool balance cannot cover the payout.
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        if amount > self.total_assets {
            return Err(MandateError::withdrawal_blocked(format!(
                "payout {} exceeds pool balance {}",
                amount, self.total_assets
            )));
        }
        self.total_assets -= amount;
        Ok(())
    }
}
