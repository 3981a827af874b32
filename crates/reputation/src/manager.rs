//! Executor reputation state: tier assignment, whitelisting, and the
//! sticky ban flag.

use crate::tier::{Tier, TierTable};
use mandate_core::config::TierConfig;
use mandate_core::error::{MandateError, Result};
use mandate_core::types::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-executor identity state. Never deleted once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorReputation {
    pub tier: Tier,
    pub is_whitelisted: bool,
    /// Sticky: once set there is no clearing path.
    pub is_banned: bool,
}

impl Default for ExecutorReputation {
    fn default() -> Self {
        Self {
            tier: Tier::Unverified,
            is_whitelisted: false,
            is_banned: false,
        }
    }
}

/// Maintains executor reputations and owns the injected tier table.
#[derive(Debug, Clone)]
pub struct ReputationManager {
    reputations: HashMap<String, ExecutorReputation>,
    table: TierTable,
}

impl ReputationManager {
    #[must_use]
    pub fn new(table: TierTable) -> Self {
        Self {
            reputations: HashMap::new(),
            table,
        }
    }

    /// Returns the executor's tier. Unknown executors are UNVERIFIED.
    #[must_use]
    pub fn get_tier(&self, executor: &str) -> Tier {
        self.reputations
            .get(executor)
            .map_or(Tier::Unverified, |r| r.tier)
    }

    /// Returns true if the executor carries the sticky ban flag.
    #[must_use]
    pub fn is_banned(&self, executor: &str) -> bool {
        self.reputations.get(executor).is_some_and(|r| r.is_banned)
    }

    /// Returns the executor's full reputation record, if one exists.
    #[must_use]
    pub fn get(&self, executor: &str) -> Option<&ExecutorReputation> {
        self.reputations.get(executor)
    }

    /// Pure tier-config lookup with no side effects.
    #[must_use]
    pub fn tier_config(&self, tier: Tier) -> &TierConfig {
        self.table.get(tier)
    }

    /// The injected tier table.
    #[must_use]
    pub const fn table(&self) -> &TierTable {
        &self.table
    }

    /// Assigns a tier, implicitly whitelisting the executor. Admin-only.
    ///
    /// A ban is not cleared by re-tiering; the flag is sticky.
    ///
    /// # Errors
    /// `Unauthorized` unless called with the admin role.
    pub fn set_tier(&mut self, caller: Role, executor: &str, tier: Tier) -> Result<()> {
        if caller != Role::Admin {
            return Err(MandateError::unauthorized("Admin"));
        }
        let entry = self.reputations.entry(executor.to_string()).or_default();
        entry.tier = tier;
        entry.is_whitelisted = true;
        tracing::info!("executor {} assigned tier {}", executor, tier);
        Ok(())
    }

    /// Sets the sticky ban flag. Admin-only; there is no un-ban operation.
    ///
    /// # Errors
    /// `Unauthorized` unless called with the admin role.
    pub fn ban(&mut self, caller: Role, executor: &str, reason: &str) -> Result<()> {
        if caller != Role::Admin {
            return Err(MandateError::unauthorized("Admin"));
        }
        let entry = self.reputations.entry(executor.to_string()).or_default();
        entry.is_banned = true;
        tracing::warn!("executor {} banned: {}", executor, reason);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ReputationManager {
        ReputationManager::new(TierTable::default())
    }

    // ==================== Tier Assignment Tests ====================

    #[test]
    fn unknown_executor_is_unverified() {
        let m = manager();
        assert_eq!(m.get_tier("alice"), Tier::Unverified);
        assert!(!m.is_banned("alice"));
    }

    #[test]
    fn set_tier_whitelists() {
        let mut m = manager();
        m.set_tier(Role::Admin, "alice", Tier::Advanced).unwrap();
        assert_eq!(m.get_tier("alice"), Tier::Advanced);
        assert!(m.get("alice").unwrap().is_whitelisted);
    }

    #[test]
    fn set_tier_requires_admin() {
        let mut m = manager();
        let err = m
            .set_tier(Role::Public, "alice", Tier::Elite)
            .unwrap_err();
        assert_eq!(err.kind(), mandate_core::ErrorKind::AccessViolation);
    }

    // ==================== Ban Tests ====================

    #[test]
    fn ban_is_sticky_across_retier() {
        let mut m = manager();
        m.ban(Role::Admin, "mallory", "constraint manipulation")
            .unwrap();
        assert!(m.is_banned("mallory"));

        // Re-tiering does not clear the flag.
        m.set_tier(Role::Admin, "mallory", Tier::Verified).unwrap();
        assert!(m.is_banned("mallory"));
        assert_eq!(m.get_tier("mallory"), Tier::Verified);
    }

    #[test]
    fn ban_requires_admin() {
        let mut m = manager();
        assert!(m
            .ban(Role::AllocationController, "mallory", "nope")
            .is_err());
        assert!(!m.is_banned("mallory"));
    }

    #[test]
    fn tier_config_lookup_is_pure() {
        let m = manager();
        let config = m.tier_config(Tier::Unverified);
        assert_eq!(config.stake_required_bps, 5000);
    }
}
