use mandate_core::config::{TierConfig, TIER_COUNT};
use mandate_core::error::{MandateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Executor risk classification, ordinal 0..4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Unverified,
    Verified,
    Advanced,
    Professional,
    Elite,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Self; TIER_COUNT] = [
        Self::Unverified,
        Self::Verified,
        Self::Advanced,
        Self::Professional,
        Self::Elite,
    ];

    /// Ordinal used to index the tier table.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Unverified => 0,
            Self::Verified => 1,
            Self::Advanced => 2,
            Self::Professional => 3,
            Self::Elite => 4,
        }
    }

    /// Looks a tier up by ordinal.
    #[must_use]
    pub const fn from_ordinal(ordinal: usize) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Unverified),
            1 => Some(Self::Verified),
            2 => Some(Self::Advanced),
            3 => Some(Self::Professional),
            4 => Some(Self::Elite),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unverified => "UNVERIFIED",
            Self::Verified => "VERIFIED",
            Self::Advanced => "ADVANCED",
            Self::Professional => "PROFESSIONAL",
            Self::Elite => "ELITE",
        };
        f.write_str(s)
    }
}

/// Validated tier limit table, injected at construction rather than read
/// from ambient configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierTable {
    tiers: Vec<TierConfig>,
}

impl TierTable {
    /// Builds a table from per-tier configs, one per ordinal.
    ///
    /// # Errors
    /// Returns `InvalidConfig` on a wrong tier count or any tier violating
    /// the LP-protection invariant (`stake_required_bps > max_drawdown_bps`).
    pub fn new(tiers: Vec<TierConfig>) -> Result<Self> {
        if tiers.len() != TIER_COUNT {
            return Err(MandateError::invalid_config(format!(
                "expected {} tiers, found {}",
                TIER_COUNT,
                tiers.len()
            )));
        }
        for tier in &tiers {
            tier.validate()?;
        }
        Ok(Self { tiers })
    }

    /// Pure lookup with no side effects; safe to call from any context.
    #[must_use]
    pub fn get(&self, tier: Tier) -> &TierConfig {
        &self.tiers[tier.ordinal()]
    }

    /// Iterates (tier, config) pairs in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &TierConfig)> {
        Tier::ALL.iter().map(move |t| (*t, self.get(*t)))
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: mandate_core::EngineConfig::default().tiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Tier Tests ====================

    #[test]
    fn ordinals_round_trip() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_ordinal(tier.ordinal()), Some(tier));
        }
        assert_eq!(Tier::from_ordinal(5), None);
    }

    #[test]
    fn tier_ordering() {
        assert!(Tier::Unverified < Tier::Elite);
        assert!(Tier::Advanced > Tier::Verified);
    }

    // ==================== TierTable Tests ====================

    #[test]
    fn default_table_is_valid() {
        let table = TierTable::default();
        for (tier, config) in table.iter() {
            assert!(
                config.stake_required_bps > config.max_drawdown_bps,
                "{tier} under-collateralizes"
            );
        }
    }

    #[test]
    fn rejects_wrong_count() {
        assert!(TierTable::new(vec![]).is_err());
    }

    #[test]
    fn rejects_under_collateralized_tier() {
        let mut tiers = mandate_core::EngineConfig::default().tiers;
        tiers[2].stake_required_bps = tiers[2].max_drawdown_bps;
        assert!(TierTable::new(tiers).is_err());
    }

    #[test]
    fn lookup_matches_ordinal() {
        let table = TierTable::default();
        assert_eq!(table.get(Tier::Unverified).name, "unverified");
        assert_eq!(table.get(Tier::Elite).name, "elite");
    }
}
