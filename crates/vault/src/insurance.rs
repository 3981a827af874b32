use mandate_core::math::BPS_DENOM;
use mandate_core::types::Amount;
use serde::{Deserialize, Serialize};

/// Insurance fund: accumulates a fraction of settlement fees and absorbs
/// losses beyond what staked collateral covers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsuranceFund {
    balance: Amount,
}

impl InsuranceFund {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn balance(&self) -> Amount {
        self.balance
    }

    /// Fund balance as a share of pool assets, floor-rounded bps. Zero for
    /// an empty pool.
    #[must_use]
    pub fn coverage_ratio_bps(&self, total_assets: Amount) -> u128 {
        if total_assets == 0 {
            return 0;
        }
        self.balance.saturating_mul(BPS_DENOM) / total_assets
    }

    /// Credits a settlement fee contribution.
    pub fn record_contribution(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
        if amount > 0 {
            tracing::debug!("insurance contribution {} -> balance {}", amount, self.balance);
        }
    }

    /// Pays out toward a loss shortfall, bounded by the fund balance.
    /// Returns the amount actually covered.
    pub fn cover_shortfall(&mut self, shortfall: Amount) -> Amount {
        let paid = self.balance.min(shortfall);
        self.balance -= paid;
        if paid > 0 {
            tracing::warn!(
                "insurance covered {} of {} shortfall, balance {}",
                paid,
                shortfall,
                self.balance
            );
        }
        paid
    }
}
