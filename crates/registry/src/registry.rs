//! Rights token registry: mints, tracks, and terminates execution-rights
//! records.

use crate::expiry::DailyExpiryBucket;
use crate::record::{FeeTerms, RightsConstraints, RightsRecord, RightsStatus};
use mandate_core::config::MandateConfig;
use mandate_core::error::{MandateError, Result};
use mandate_core::math::mul_bps_ceil;
use mandate_core::types::{Amount, LifecycleState, Pnl, RightsId, Role, UnixTime};
use mandate_reputation::ReputationManager;
use mandate_risk::CircuitBreaker;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters of a mint request, supplied by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    pub executor: String,
    pub capital_limit: Amount,
    pub duration_secs: UnixTime,
    pub constraints: RightsConstraints,
    pub fees: FeeTerms,
    /// Collateral actually transferred with the request.
    pub stake_posted: Amount,
}

/// Owns every rights record and its lifecycle transitions.
#[derive(Debug, Clone)]
pub struct RightsRegistry {
    config: MandateConfig,
    records: HashMap<RightsId, RightsRecord>,
    by_executor: HashMap<String, Vec<RightsId>>,
    expiry_buckets: DailyExpiryBucket,
    next_id: u64,
}

impl RightsRegistry {
    #[must_use]
    pub fn new(config: MandateConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
            by_executor: HashMap::new(),
            expiry_buckets: DailyExpiryBucket::new(),
            next_id: 1,
        }
    }

    // ==================== Mint ====================

    /// Validates and mints a new rights record.
    ///
    /// Validation order is fixed: ban, capital limit, drawdown, risk level,
    /// duration, stake, breaker. On success the record is ACTIVE and its
    /// capital limit is accumulated into the daily expiry bucket.
    ///
    /// # Errors
    /// One of `ExecutorBanned`, `CapitalExceedsTierLimit`,
    /// `DrawdownExceedsTierLimit`, `RiskLevelExceedsTierLimit`,
    /// `DurationTooShort`, `DurationTooLong`, `InsufficientStake`,
    /// `CircuitBreakerActive`.
    pub fn mint(
        &mut self,
        reputation: &ReputationManager,
        breaker: Option<&CircuitBreaker>,
        request: MintRequest,
        now: UnixTime,
    ) -> Result<RightsId> {
        if reputation.is_banned(&request.executor) {
            return Err(MandateError::banned(request.executor));
        }

        let tier = reputation.get_tier(&request.executor);
        let tier_config = reputation.tier_config(tier);

        if request.capital_limit > tier_config.max_capital {
            return Err(MandateError::CapitalExceedsTierLimit {
                requested: request.capital_limit,
                tier_max: tier_config.max_capital,
            });
        }
        if request.constraints.max_drawdown_bps > tier_config.max_drawdown_bps {
            return Err(MandateError::DrawdownExceedsTierLimit {
                requested_bps: request.constraints.max_drawdown_bps,
                tier_max_bps: tier_config.max_drawdown_bps,
            });
        }
        if request.constraints.max_leverage > tier_config.max_leverage {
            return Err(MandateError::RiskLevelExceedsTierLimit {
                requested: request.constraints.max_leverage,
                tier_max: tier_config.max_leverage,
            });
        }
        if request.duration_secs < self.config.min_duration_secs {
            return Err(MandateError::DurationTooShort {
                duration_secs: request.duration_secs,
                min_secs: self.config.min_duration_secs,
            });
        }
        if request.duration_secs > self.config.max_duration_secs {
            return Err(MandateError::DurationTooLong {
                duration_secs: request.duration_secs,
                max_secs: self.config.max_duration_secs,
            });
        }

        let required_stake = mul_bps_ceil(request.capital_limit, tier_config.stake_required_bps);
        let posted = request.fees.staked_amount.min(request.stake_posted);
        if posted < required_stake {
            return Err(MandateError::InsufficientStake {
                posted,
                required: required_stake,
            });
        }

        if let Some(breaker) = breaker {
            breaker.ensure_not_paused()?;
        }

        let id = RightsId(self.next_id);
        self.next_id += 1;

        let mut record = RightsRecord {
            id,
            executor: request.executor.clone(),
            capital_limit: request.capital_limit,
            start_time: now,
            expiry_time: now + request.duration_secs,
            constraints: request.constraints,
            fees: request.fees,
            status: RightsStatus {
                capital_deployed: 0,
                realized_pnl: 0,
                unrealized_pnl: 0,
                high_water_mark: request.capital_limit,
                max_drawdown_hit_bps: 0,
            },
            lifecycle_state: LifecycleState::Pending,
        };
        // PENDING never escapes the mint call.
        record.lifecycle_state = LifecycleState::Active;

        self.expiry_buckets
            .accumulate(record.expiry_time, record.capital_limit);
        self.by_executor
            .entry(request.executor)
            .or_default()
            .push(id);

        tracing::info!(
            "minted {} for {} (tier {}): limit {}, expires {}",
            id,
            record.executor,
            tier,
            record.capital_limit,
            record.expiry_time
        );
        self.records.insert(id, record);
        Ok(id)
    }

    // ==================== Status Updates ====================

    /// Applies deployment and PnL deltas to an ACTIVE record. Allocation
    /// controller only.
    ///
    /// # Errors
    /// `Unauthorized` for other callers; `RightsNotFound`/`RightsNotActive`
    /// for missing or terminal records.
    pub fn update_status(
        &mut self,
        caller: Role,
        id: RightsId,
        deployed_delta: Pnl,
        realized_pnl_delta: Pnl,
        unrealized_pnl_delta: Pnl,
    ) -> Result<&RightsRecord> {
        if caller != Role::AllocationController {
            return Err(MandateError::unauthorized("AllocationController"));
        }
        let record = self
            .records
            .get_mut(&id)
            .ok_or(MandateError::RightsNotFound { id })?;
        if !record.is_active() {
            return Err(MandateError::RightsNotActive { id });
        }
        record.apply_status_deltas(deployed_delta, realized_pnl_delta, unrealized_pnl_delta);
        Ok(&*record)
    }

    // ==================== Lifecycle Transitions ====================

    /// Marks an elapsed record EXPIRED. Callable by anyone.
    ///
    /// Idempotent in effect: re-calling on an already-EXPIRED record is a
    /// no-op, not an error. Returns true if this call performed the
    /// transition.
    ///
    /// # Errors
    /// `RightsNotFound` for unknown ids; `RightsNotActive` before expiry or
    /// for records settled/liquidated instead.
    pub fn mark_expired(&mut self, id: RightsId, now: UnixTime) -> Result<bool> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(MandateError::RightsNotFound { id })?;
        match record.lifecycle_state {
            LifecycleState::Expired => Ok(false),
            LifecycleState::Active if record.is_expired(now) => {
                record.lifecycle_state = LifecycleState::Expired;
                tracing::info!("{} expired", id);
                Ok(true)
            }
            _ => Err(MandateError::RightsNotActive { id }),
        }
    }

    /// Forces an ACTIVE record to LIQUIDATED. Allocation controller only;
    /// used on a live constraint breach.
    ///
    /// # Errors
    /// `Unauthorized` for other callers; `RightsNotFound`/`RightsNotActive`
    /// for missing or terminal records.
    pub fn mark_liquidated(&mut self, caller: Role, id: RightsId) -> Result<()> {
        if caller != Role::AllocationController {
            return Err(MandateError::unauthorized("AllocationController"));
        }
        let record = self
            .records
            .get_mut(&id)
            .ok_or(MandateError::RightsNotFound { id })?;
        if !record.is_active() {
            return Err(MandateError::RightsNotActive { id });
        }
        record.lifecycle_state = LifecycleState::Liquidated;
        tracing::warn!("{} liquidated", id);
        Ok(())
    }

    /// Commits a settlement: transitions ACTIVE → SETTLED and freezes the
    /// final PnL. Settlement authority only; re-settling fails.
    ///
    /// # Errors
    /// `Unauthorized` for other callers; `RightsNotFound`/`RightsNotActive`
    /// for missing or already-terminal records.
    pub fn complete_settlement(
        &mut self,
        caller: Role,
        id: RightsId,
        final_pnl: Pnl,
    ) -> Result<()> {
        if caller != Role::SettlementAuthority {
            return Err(MandateError::unauthorized("SettlementAuthority"));
        }
        let record = self
            .records
            .get_mut(&id)
            .ok_or(MandateError::RightsNotFound { id })?;
        if !record.is_active() {
            return Err(MandateError::RightsNotActive { id });
        }
        record.lifecycle_state = LifecycleState::Settled;
        record.status.realized_pnl = final_pnl;
        record.status.unrealized_pnl = 0;
        tracing::info!("{} settled with final pnl {}", id, final_pnl);
        Ok(())
    }

    // ==================== Views ====================

    #[must_use]
    pub fn get(&self, id: RightsId) -> Option<&RightsRecord> {
        self.records.get(&id)
    }

    /// ACTIVE and not yet elapsed.
    #[must_use]
    pub fn is_valid(&self, id: RightsId, now: UnixTime) -> bool {
        self.records
            .get(&id)
            .is_some_and(|r| r.is_active() && !r.is_expired(now))
    }

    /// Pure time predicate on the record's window.
    #[must_use]
    pub fn is_expired(&self, id: RightsId, now: UnixTime) -> bool {
        self.records.get(&id).is_some_and(|r| r.is_expired(now))
    }

    /// All ACTIVE records held by an executor.
    #[must_use]
    pub fn active_records(&self, executor: &str) -> Vec<&RightsRecord> {
        self.by_executor
            .get(executor)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.records.get(id))
                    .filter(|r| r.is_active())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Forward-looking expiry schedule.
    #[must_use]
    pub const fn expiry_buckets(&self) -> &DailyExpiryBucket {
        &self.expiry_buckets
    }

    #[must_use]
    pub const fn duration_bounds(&self) -> (UnixTime, UnixTime) {
        (self.config.min_duration_secs, self.config.max_duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandate_reputation::{Tier, TierTable};

    const DAY: UnixTime = 86_400;

    fn reputation() -> ReputationManager {
        ReputationManager::new(TierTable::default())
    }

    fn registry() -> RightsRegistry {
        RightsRegistry::new(MandateConfig {
            min_duration_secs: DAY,
            max_duration_secs: 90 * DAY,
        })
    }

    fn request(executor: &str, capital_limit: Amount, stake: Amount) -> MintRequest {
        MintRequest {
            executor: executor.to_string(),
            capital_limit,
            duration_secs: 7 * DAY,
            constraints: RightsConstraints {
                max_leverage: 1,
                max_drawdown_bps: 800,
                max_position_size_bps: 10_000,
                allowed_adapters: vec![],
                allowed_assets: vec![],
            },
            fees: FeeTerms {
                base_fee_apr_bps: 200,
                profit_share_bps: 2000,
                staked_amount: stake,
            },
            stake_posted: stake,
        }
    }

    // ==================== Mint Validation Tests ====================

    #[test]
    fn mint_happy_path_is_active() {
        let mut reg = registry();
        let rep = reputation();
        // unverified tier: max capital 1_000_000_000, 50% stake required
        let id = rep_mint(&mut reg, &rep, request("alice", 1_000_000, 500_000));
        let record = reg.get(id).unwrap();
        assert_eq!(record.lifecycle_state, LifecycleState::Active);
        assert_eq!(record.start_time, 1000);
        assert_eq!(record.expiry_time, 1000 + 7 * DAY);
        assert_eq!(record.status.high_water_mark, record.capital_limit);
    }

    fn rep_mint(reg: &mut RightsRegistry, rep: &ReputationManager, req: MintRequest) -> RightsId {
        reg.mint(rep, None, req, 1000).unwrap()
    }

    #[test]
    fn mint_ids_are_monotonic() {
        let mut reg = registry();
        let rep = reputation();
        let a = rep_mint(&mut reg, &rep, request("alice", 1_000, 500));
        let b = rep_mint(&mut reg, &rep, request("bob", 1_000, 500));
        assert!(b > a);
    }

    #[test]
    fn banned_executor_cannot_mint() {
        let mut reg = registry();
        let mut rep = reputation();
        rep.ban(Role::Admin, "mallory", "abuse").unwrap();
        let err = reg
            .mint(&rep, None, request("mallory", 1_000, 500), 1000)
            .unwrap_err();
        assert!(matches!(err, MandateError::ExecutorBanned { .. }));
    }

    #[test]
    fn capital_above_tier_limit_rejected() {
        let mut reg = registry();
        let rep = reputation();
        let err = reg
            .mint(
                &rep,
                None,
                request("alice", 1_000_000_001, 600_000_000),
                1000,
            )
            .unwrap_err();
        assert!(matches!(err, MandateError::CapitalExceedsTierLimit { .. }));
    }

    #[test]
    fn drawdown_above_tier_ceiling_rejected() {
        let mut reg = registry();
        let rep = reputation();
        let mut req = request("alice", 1_000, 500);
        // unverified ceiling is 1000 bps
        req.constraints.max_drawdown_bps = 1001;
        let err = reg.mint(&rep, None, req, 1000).unwrap_err();
        assert!(matches!(err, MandateError::DrawdownExceedsTierLimit { .. }));
    }

    #[test]
    fn leverage_above_tier_ceiling_rejected() {
        let mut reg = registry();
        let rep = reputation();
        let mut req = request("alice", 1_000, 500);
        req.constraints.max_leverage = 2;
        let err = reg.mint(&rep, None, req, 1000).unwrap_err();
        assert!(matches!(
            err,
            MandateError::RiskLevelExceedsTierLimit { .. }
        ));
    }

    #[test]
    fn higher_tier_unlocks_leverage() {
        let mut reg = registry();
        let mut rep = reputation();
        rep.set_tier(Role::Admin, "alice", Tier::Advanced).unwrap();
        let mut req = request("alice", 1_000, 500);
        req.constraints.max_leverage = 3;
        req.constraints.max_drawdown_bps = 2000;
        assert!(reg.mint(&rep, None, req, 1000).is_ok());
    }

    #[test]
    fn duration_bounds_enforced() {
        let mut reg = registry();
        let rep = reputation();

        let mut req = request("alice", 1_000, 500);
        req.duration_secs = DAY - 1;
        assert!(matches!(
            reg.mint(&rep, None, req, 1000).unwrap_err(),
            MandateError::DurationTooShort { .. }
        ));

        let mut req = request("alice", 1_000, 500);
        req.duration_secs = 90 * DAY + 1;
        assert!(matches!(
            reg.mint(&rep, None, req, 1000).unwrap_err(),
            MandateError::DurationTooLong { .. }
        ));
    }

    #[test]
    fn unverified_tier_stake_scenario() {
        // UNVERIFIED requires 50% stake: $50 capital -> $25 required
        let mut reg = registry();
        let rep = reputation();

        let err = reg
            .mint(&rep, None, request("alice", 50, 24), 1000)
            .unwrap_err();
        assert!(matches!(
            err,
            MandateError::InsufficientStake {
                posted: 24,
                required: 25
            }
        ));

        let id = reg.mint(&rep, None, request("alice", 50, 25), 1000).unwrap();
        assert_eq!(
            reg.get(id).unwrap().lifecycle_state,
            LifecycleState::Active
        );
    }

    #[test]
    fn stake_posted_below_declared_stake_rejected() {
        let mut reg = registry();
        let rep = reputation();
        let mut req = request("alice", 50, 25);
        req.stake_posted = 20;
        assert!(matches!(
            reg.mint(&rep, None, req, 1000).unwrap_err(),
            MandateError::InsufficientStake { .. }
        ));
    }

    #[test]
    fn paused_breaker_blocks_mint() {
        let mut reg = registry();
        let rep = reputation();
        let mut breaker = CircuitBreaker::new(500);
        breaker.emergency_pause(Role::Admin).unwrap();
        let err = reg
            .mint(&rep, Some(&breaker), request("alice", 1_000, 500), 1000)
            .unwrap_err();
        assert!(matches!(err, MandateError::CircuitBreakerActive));
        // no breaker configured: mint proceeds
        assert!(reg.mint(&rep, None, request("alice", 1_000, 500), 1000).is_ok());
    }

    #[test]
    fn failed_mint_creates_no_record() {
        let mut reg = registry();
        let rep = reputation();
        let _ = reg.mint(&rep, None, request("alice", 50, 24), 1000);
        assert!(reg.active_records("alice").is_empty());
        assert_eq!(reg.expiry_buckets().scheduled_for(1000 + 7 * DAY), 0);
    }

    #[test]
    fn mint_accumulates_expiry_bucket() {
        let mut reg = registry();
        let rep = reputation();
        rep_mint(&mut reg, &rep, request("alice", 1_000, 500));
        rep_mint(&mut reg, &rep, request("bob", 2_000, 1_000));
        assert_eq!(reg.expiry_buckets().scheduled_for(1000 + 7 * DAY), 3_000);
    }

    // ==================== Lifecycle Tests ====================

    #[test]
    fn mark_expired_boundary_and_idempotence() {
        let mut reg = registry();
        let rep = reputation();
        let id = rep_mint(&mut reg, &rep, request("alice", 1_000, 500));
        let expiry = reg.get(id).unwrap().expiry_time;

        assert!(!reg.is_expired(id, expiry - 1));
        assert!(reg.is_expired(id, expiry));

        // before expiry: rejected
        assert!(reg.mark_expired(id, expiry - 1).is_err());
        // at expiry: transitions exactly once
        assert!(reg.mark_expired(id, expiry).unwrap());
        assert_eq!(
            reg.get(id).unwrap().lifecycle_state,
            LifecycleState::Expired
        );
        // repeat call is a no-op, not an error
        assert!(!reg.mark_expired(id, expiry + 5).unwrap());
    }

    #[test]
    fn mark_expired_on_settled_record_fails() {
        let mut reg = registry();
        let rep = reputation();
        let id = rep_mint(&mut reg, &rep, request("alice", 1_000, 500));
        reg.complete_settlement(Role::SettlementAuthority, id, 0)
            .unwrap();
        let expiry = reg.get(id).unwrap().expiry_time;
        assert!(reg.mark_expired(id, expiry).is_err());
    }

    #[test]
    fn liquidation_requires_controller_role() {
        let mut reg = registry();
        let rep = reputation();
        let id = rep_mint(&mut reg, &rep, request("alice", 1_000, 500));
        assert!(reg.mark_liquidated(Role::Public, id).is_err());
        reg.mark_liquidated(Role::AllocationController, id).unwrap();
        assert_eq!(
            reg.get(id).unwrap().lifecycle_state,
            LifecycleState::Liquidated
        );
        // terminal: cannot liquidate twice
        assert!(reg
            .mark_liquidated(Role::AllocationController, id)
            .is_err());
    }

    #[test]
    fn settlement_is_not_reenterable() {
        let mut reg = registry();
        let rep = reputation();
        let id = rep_mint(&mut reg, &rep, request("alice", 1_000, 500));
        reg.complete_settlement(Role::SettlementAuthority, id, 77)
            .unwrap();
        let record = reg.get(id).unwrap();
        assert_eq!(record.lifecycle_state, LifecycleState::Settled);
        assert_eq!(record.status.realized_pnl, 77);
        assert_eq!(record.status.unrealized_pnl, 0);

        let err = reg
            .complete_settlement(Role::SettlementAuthority, id, 77)
            .unwrap_err();
        assert_eq!(err.kind(), mandate_core::ErrorKind::StateConflict);
    }

    #[test]
    fn update_status_requires_active_record() {
        let mut reg = registry();
        let rep = reputation();
        let id = rep_mint(&mut reg, &rep, request("alice", 1_000, 500));
        assert!(reg
            .update_status(Role::Public, id, 0, 10, 0)
            .is_err());
        reg.update_status(Role::AllocationController, id, 100, 0, 0)
            .unwrap();
        reg.complete_settlement(Role::SettlementAuthority, id, 0)
            .unwrap();
        assert!(reg
            .update_status(Role::AllocationController, id, 0, 10, 0)
            .is_err());
    }

    // ==================== View Tests ====================

    #[test]
    fn validity_window() {
        let mut reg = registry();
        let rep = reputation();
        let id = rep_mint(&mut reg, &rep, request("alice", 1_000, 500));
        let expiry = reg.get(id).unwrap().expiry_time;
        assert!(reg.is_valid(id, expiry - 1));
        assert!(!reg.is_valid(id, expiry));
        assert!(!reg.is_valid(RightsId(999), 0));
    }

    #[test]
    fn active_records_filters_terminal_states() {
        let mut reg = registry();
        let rep = reputation();
        let a = rep_mint(&mut reg, &rep, request("alice", 1_000, 500));
        let b = rep_mint(&mut reg, &rep, request("alice", 2_000, 1_000));
        reg.complete_settlement(Role::SettlementAuthority, a, 0)
            .unwrap();
        let active = reg.active_records("alice");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b);
    }
}
