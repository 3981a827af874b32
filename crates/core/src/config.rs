use crate::error::{MandateError, Result};
use crate::types::{Amount, Bps, UnixTime};
use serde::{Deserialize, Serialize};

/// Number of executor tiers (ordinals 0..4, UNVERIFIED through ELITE).
pub const TIER_COUNT: usize = 5;

/// Top-level engine configuration, loaded once at construction and updated
/// only through explicit admin operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub utilization: UtilizationConfig,
    pub exposure: ExposureConfig,
    pub breaker: BreakerConfig,
    pub mandate: MandateConfig,
    pub settlement: SettlementConfig,
    /// Tier table indexed by tier ordinal.
    pub tiers: Vec<TierConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationConfig {
    /// Ceiling on allocated capital as a share of total assets.
    pub max_utilization_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureConfig {
    /// Ceiling on any single asset's share of total assets.
    pub max_single_asset_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Daily realized-loss ratio that trips the breaker.
    pub max_daily_loss_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MandateConfig {
    /// Shortest mintable rights duration.
    pub min_duration_secs: UnixTime,
    /// Longest mintable rights duration.
    pub max_duration_secs: UnixTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Share of settlement profit routed to the insurance fund.
    pub insurance_fee_bps: Bps,
    /// Loss forgiven before stake slashing kicks in, as bps of the stake.
    pub loss_tolerance_bps: Bps,
}

/// Per-tier limits. Configuration data, not per-executor state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// Human-readable tier name.
    pub name: String,
    /// Upper bound on a single rights record's capital limit.
    pub max_capital: Amount,
    /// Required collateral as bps of the record's capital limit.
    pub stake_required_bps: Bps,
    /// Ceiling on the record's drawdown constraint.
    pub max_drawdown_bps: Bps,
    /// Maximum leverage multiplier permitted at this tier.
    pub max_leverage: u32,
}

impl TierConfig {
    /// Checks the LP-protection invariant: posted collateral must always
    /// exceed the maximum permitted loss.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `stake_required_bps <= max_drawdown_bps`
    /// or either value exceeds 10000 bps.
    pub fn validate(&self) -> Result<()> {
        if self.stake_required_bps > 10_000 || self.max_drawdown_bps > 10_000 {
            return Err(MandateError::invalid_config(format!(
                "tier {}: bps values must not exceed 10000",
                self.name
            )));
        }
        if self.stake_required_bps <= self.max_drawdown_bps {
            return Err(MandateError::invalid_config(format!(
                "tier {}: stake_required_bps ({}) must exceed max_drawdown_bps ({})",
                self.name, self.stake_required_bps, self.max_drawdown_bps
            )));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Validates every section and every tier.
    ///
    /// # Errors
    /// Returns `InvalidConfig` on any out-of-range bps value, inverted
    /// duration bounds, wrong tier count, or a tier violating the
    /// LP-protection invariant.
    pub fn validate(&self) -> Result<()> {
        if self.utilization.max_utilization_bps > 10_000 {
            return Err(MandateError::invalid_config(
                "max_utilization_bps must not exceed 10000",
            ));
        }
        if self.exposure.max_single_asset_bps > 10_000 {
            return Err(MandateError::invalid_config(
                "max_single_asset_bps must not exceed 10000",
            ));
        }
        if self.breaker.max_daily_loss_bps > 10_000 {
            return Err(MandateError::invalid_config(
                "max_daily_loss_bps must not exceed 10000",
            ));
        }
        if self.settlement.insurance_fee_bps > 10_000 || self.settlement.loss_tolerance_bps > 10_000
        {
            return Err(MandateError::invalid_config(
                "settlement bps values must not exceed 10000",
            ));
        }
        if self.mandate.min_duration_secs <= 0
            || self.mandate.max_duration_secs < self.mandate.min_duration_secs
        {
            return Err(MandateError::invalid_config(
                "mandate duration bounds must satisfy 0 < min <= max",
            ));
        }
        if self.tiers.len() != TIER_COUNT {
            return Err(MandateError::invalid_config(format!(
                "expected {} tiers, found {}",
                TIER_COUNT,
                self.tiers.len()
            )));
        }
        for tier in &self.tiers {
            tier.validate()?;
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utilization: UtilizationConfig {
                max_utilization_bps: 7000,
            },
            exposure: ExposureConfig {
                max_single_asset_bps: 3000,
            },
            breaker: BreakerConfig {
                max_daily_loss_bps: 500,
            },
            mandate: MandateConfig {
                min_duration_secs: 86_400,
                max_duration_secs: 7_776_000,
            },
            settlement: SettlementConfig {
                insurance_fee_bps: 500,
                loss_tolerance_bps: 100,
            },
            tiers: vec![
                TierConfig {
                    name: "unverified".to_string(),
                    max_capital: 1_000_000_000,
                    stake_required_bps: 5000,
                    max_drawdown_bps: 1000,
                    max_leverage: 1,
                },
                TierConfig {
                    name: "verified".to_string(),
                    max_capital: 10_000_000_000,
                    stake_required_bps: 4000,
                    max_drawdown_bps: 1500,
                    max_leverage: 2,
                },
                TierConfig {
                    name: "advanced".to_string(),
                    max_capital: 50_000_000_000,
                    stake_required_bps: 3000,
                    max_drawdown_bps: 2000,
                    max_leverage: 3,
                },
                TierConfig {
                    name: "professional".to_string(),
                    max_capital: 250_000_000_000,
                    stake_required_bps: 2500,
                    max_drawdown_bps: 2000,
                    max_leverage: 5,
                },
                TierConfig {
                    name: "elite".to_string(),
                    max_capital: 1_000_000_000_000,
                    stake_required_bps: 2000,
                    max_drawdown_bps: 1500,
                    max_leverage: 10,
                },
            ],
        }
    }
}
