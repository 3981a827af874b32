//! Per-asset concentration policy.
//!
//! Stateless: the caller supplies the asset's current allocated total; this
//! component only answers whether the proposed total keeps the asset's share
//! of the pool at or below the ceiling (default 30%).

use mandate_core::error::{MandateError, Result};
use mandate_core::math::BPS_DENOM;
use mandate_core::types::{Amount, Bps, Role};
use serde::{Deserialize, Serialize};

/// Single-asset exposure ceiling check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureManager {
    max_single_asset_bps: Bps,
}

impl ExposureManager {
    /// Creates a manager with the given per-asset ceiling.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for values above 10000 bps.
    pub fn new(max_single_asset_bps: Bps) -> Result<Self> {
        if max_single_asset_bps > 10_000 {
            return Err(MandateError::invalid_config(
                "max_single_asset_bps must not exceed 10000",
            ));
        }
        Ok(Self {
            max_single_asset_bps,
        })
    }

    /// Current ceiling in basis points.
    #[must_use]
    pub const fn max_single_asset_bps(&self) -> Bps {
        self.max_single_asset_bps
    }

    /// Updates the ceiling. Admin-only.
    ///
    /// # Errors
    /// `Unauthorized` for non-admin callers; `InvalidConfig` above 10000 bps.
    pub fn set_max_single_asset(&mut self, caller: Role, bps: Bps) -> Result<()> {
        if caller != Role::Admin {
            return Err(MandateError::unauthorized("Admin"));
        }
        if bps > 10_000 {
            return Err(MandateError::invalid_config(
                "max_single_asset_bps must not exceed 10000",
            ));
        }
        tracing::info!(
            "max single-asset exposure changed: {} -> {} bps",
            self.max_single_asset_bps,
            bps
        );
        self.max_single_asset_bps = bps;
        Ok(())
    }

    /// Whether the proposed per-asset allocation keeps that asset's share at
    /// or below the ceiling. Cross-multiplied so no rounding can ever favor
    /// the claimant.
    #[must_use]
    pub fn can_add_exposure(&self, proposed_asset_allocation: Amount, total_assets: Amount) -> bool {
        proposed_asset_allocation.saturating_mul(BPS_DENOM)
            <= total_assets.saturating_mul(u128::from(self.max_single_asset_bps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ExposureManager {
        ExposureManager::new(3000).unwrap()
    }

    #[test]
    fn exposure_at_cap_allowed() {
        // 300_000 of 1_000_000 is exactly 30%
        assert!(manager().can_add_exposure(300_000, 1_000_000));
    }

    #[test]
    fn exposure_one_unit_over_rejected() {
        assert!(!manager().can_add_exposure(300_001, 1_000_000));
    }

    #[test]
    fn exposure_against_empty_pool() {
        // nothing may be concentrated into an empty pool
        assert!(!manager().can_add_exposure(1, 0));
        assert!(manager().can_add_exposure(0, 0));
    }

    #[test]
    fn fractional_overage_rejected() {
        // 31 of 100 would be 31%
        assert!(!manager().can_add_exposure(31, 100));
        assert!(manager().can_add_exposure(30, 100));
    }

    #[test]
    fn new_rejects_over_100_percent() {
        assert!(ExposureManager::new(10_001).is_err());
    }

    #[test]
    fn set_cap_requires_admin() {
        let mut m = manager();
        assert!(m.set_max_single_asset(Role::Public, 1000).is_err());
        m.set_max_single_asset(Role::Admin, 1000).unwrap();
        assert_eq!(m.max_single_asset_bps(), 1000);
        assert!(!m.can_add_exposure(300_000, 1_000_000));
    }
}
