//! Global utilization policy.
//!
//! Pure functions over `(total_assets, current_allocated, delta)` triples.
//! Hard gates use ceiling division so rounding can never understate
//! utilization; capacity estimates use floor division. The asymmetry is
//! deliberate and load-bearing: an optimistic estimate composed with a
//! pessimistic gate still never over-allocates.

use mandate_core::error::{MandateError, Result};
use mandate_core::math::{ceil_div, mul_bps_floor, ratio_bps_ceil, BPS_DENOM};
use mandate_core::types::{Amount, Bps, Role};
use serde::{Deserialize, Serialize};

/// Decides whether allocations and withdrawals keep pool utilization at or
/// below a configurable ceiling (default 70%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationController {
    max_utilization_bps: Bps,
}

impl UtilizationController {
    /// Creates a controller with the given ceiling.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for values above 10000 bps.
    pub fn new(max_utilization_bps: Bps) -> Result<Self> {
        if max_utilization_bps > 10_000 {
            return Err(MandateError::invalid_config(
                "max_utilization_bps must not exceed 10000",
            ));
        }
        Ok(Self {
            max_utilization_bps,
        })
    }

    /// Current ceiling in basis points.
    #[must_use]
    pub const fn max_utilization_bps(&self) -> Bps {
        self.max_utilization_bps
    }

    /// Updates the ceiling. Admin-only.
    ///
    /// # Errors
    /// `Unauthorized` for non-admin callers; `InvalidConfig` above 10000 bps.
    pub fn set_max_utilization(&mut self, caller: Role, bps: Bps) -> Result<()> {
        if caller != Role::Admin {
            return Err(MandateError::unauthorized("Admin"));
        }
        if bps > 10_000 {
            return Err(MandateError::invalid_config(
                "max_utilization_bps must not exceed 10000",
            ));
        }
        tracing::info!(
            "max utilization changed: {} -> {} bps",
            self.max_utilization_bps,
            bps
        );
        self.max_utilization_bps = bps;
        Ok(())
    }

    /// Whether adding `new_allocation` keeps utilization at or below the cap.
    ///
    /// Post-allocation utilization is ceiling-rounded, so an allocation that
    /// would push true utilization even a fraction over the cap is rejected.
    #[must_use]
    pub fn can_allocate(
        &self,
        total_assets: Amount,
        current_allocated: Amount,
        new_allocation: Amount,
    ) -> bool {
        if total_assets == 0 {
            return false;
        }
        let proposed = current_allocated.saturating_add(new_allocation);
        ratio_bps_ceil(proposed, total_assets) <= u128::from(self.max_utilization_bps)
    }

    /// Whether withdrawing `withdraw_amount` from the pool is permitted.
    ///
    /// The pool may never be drained to zero while capital is still
    /// allocated against it, and post-withdrawal utilization (ceiling
    /// rounded) must stay at or below the cap.
    #[must_use]
    pub fn can_withdraw(
        &self,
        total_assets: Amount,
        current_allocated: Amount,
        withdraw_amount: Amount,
    ) -> bool {
        if withdraw_amount > total_assets {
            return false;
        }
        let remaining = total_assets - withdraw_amount;
        if remaining == 0 {
            return current_allocated == 0;
        }
        ratio_bps_ceil(current_allocated, remaining) <= u128::from(self.max_utilization_bps)
    }

    /// Capital still allocatable under the cap. Floor-rounded (optimistic
    /// estimate; the allocation gate re-checks pessimistically).
    #[must_use]
    pub fn available_for_allocation(
        &self,
        total_assets: Amount,
        current_allocated: Amount,
    ) -> Amount {
        mul_bps_floor(total_assets, self.max_utilization_bps).saturating_sub(current_allocated)
    }

    /// Portion of the pool held back from allocation by the cap.
    #[must_use]
    pub fn reserve_amount(&self, total_assets: Amount) -> Amount {
        total_assets - mul_bps_floor(total_assets, self.max_utilization_bps)
    }

    /// Largest withdrawal that keeps utilization within the cap.
    #[must_use]
    pub fn max_withdrawable(&self, total_assets: Amount, current_allocated: Amount) -> Amount {
        if current_allocated == 0 {
            return total_assets;
        }
        if self.max_utilization_bps == 0 {
            return 0;
        }
        let required_assets = ceil_div(
            current_allocated.saturating_mul(BPS_DENOM),
            u128::from(self.max_utilization_bps),
        );
        total_assets.saturating_sub(required_assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> UtilizationController {
        UtilizationController::new(7000).unwrap()
    }

    // ==================== can_allocate Tests ====================

    #[test]
    fn allocate_exactly_at_cap_allowed() {
        // 700_000 of 1_000_000 is exactly 70%
        assert!(controller().can_allocate(1_000_000, 0, 700_000));
    }

    #[test]
    fn allocate_one_unit_over_cap_rejected() {
        // ceiling division forbids any overage
        assert!(!controller().can_allocate(1_000_000, 700_000, 1));
    }

    #[test]
    fn allocate_against_empty_pool_rejected() {
        assert!(!controller().can_allocate(0, 0, 1));
        assert!(!controller().can_allocate(0, 0, 0));
    }

    #[test]
    fn allocate_fractional_overage_rejected() {
        // 7001 of 10_000 would be 70.01%; ceiling catches it
        assert!(!controller().can_allocate(10_000, 0, 7001));
        assert!(controller().can_allocate(10_000, 0, 7000));
    }

    // ==================== can_withdraw Tests ====================

    #[test]
    fn withdraw_more_than_total_rejected() {
        assert!(!controller().can_withdraw(1000, 0, 1001));
    }

    #[test]
    fn withdraw_to_zero_with_allocation_rejected() {
        assert!(!controller().can_withdraw(1000, 1, 1000));
    }

    #[test]
    fn withdraw_to_zero_without_allocation_allowed() {
        assert!(controller().can_withdraw(1000, 0, 1000));
    }

    #[test]
    fn withdraw_keeping_utilization_at_cap_allowed() {
        // 700_000 allocated; withdrawing to exactly 1_000_000 remaining is 70%
        assert!(controller().can_withdraw(1_500_000, 700_000, 500_000));
        // one more unit pushes post-withdrawal utilization over
        assert!(!controller().can_withdraw(1_500_000, 700_000, 500_001));
    }

    // ==================== Capacity Estimate Tests ====================

    #[test]
    fn available_plus_reserve_equals_total() {
        // holds for all totals >= 10000 since floor loses less than one bps unit
        for total in [10_000u128, 10_001, 123_457, 1_000_000, 999_999_937] {
            let c = controller();
            assert_eq!(
                c.available_for_allocation(total, 0) + c.reserve_amount(total),
                total,
                "total {total}"
            );
        }
    }

    #[test]
    fn available_shrinks_with_allocation() {
        let c = controller();
        assert_eq!(c.available_for_allocation(1_000_000, 0), 700_000);
        assert_eq!(c.available_for_allocation(1_000_000, 300_000), 400_000);
        assert_eq!(c.available_for_allocation(1_000_000, 700_000), 0);
        // over-allocated pool reports zero, not underflow
        assert_eq!(c.available_for_allocation(1_000_000, 800_000), 0);
    }

    // ==================== max_withdrawable Tests ====================

    #[test]
    fn max_withdrawable_composes_with_can_withdraw() {
        let c = controller();
        for (total, allocated) in [
            (1_000_000u128, 0u128),
            (1_000_000, 350_000),
            (1_000_000, 700_000),
            (1_500_000, 700_000),
            (10_000, 1),
        ] {
            let max = c.max_withdrawable(total, allocated);
            assert!(
                c.can_withdraw(total, allocated, max),
                "total {total} allocated {allocated} max {max}"
            );
            // withdrawing significantly more must fail
            assert!(
                !c.can_withdraw(total, allocated, max + total / 100 + 1),
                "total {total} allocated {allocated}"
            );
        }
    }

    #[test]
    fn max_withdrawable_fully_utilized_pool_is_zero() {
        assert_eq!(controller().max_withdrawable(1_000_000, 700_000), 0);
    }

    #[test]
    fn max_withdrawable_zero_cap_with_allocation() {
        let c = UtilizationController::new(0).unwrap();
        assert_eq!(c.max_withdrawable(1_000_000, 1), 0);
        assert_eq!(c.max_withdrawable(1_000_000, 0), 1_000_000);
    }

    // ==================== Admin Tests ====================

    #[test]
    fn new_rejects_over_100_percent() {
        assert!(UtilizationController::new(10_001).is_err());
    }

    #[test]
    fn set_max_utilization_requires_admin() {
        let mut c = controller();
        assert!(c.set_max_utilization(Role::Public, 5000).is_err());
        assert_eq!(c.max_utilization_bps(), 7000);
        c.set_max_utilization(Role::Admin, 5000).unwrap();
        assert_eq!(c.max_utilization_bps(), 5000);
    }

    #[test]
    fn set_max_utilization_rejects_over_100_percent() {
        let mut c = controller();
        assert!(c.set_max_utilization(Role::Admin, 10_001).is_err());
    }
}
