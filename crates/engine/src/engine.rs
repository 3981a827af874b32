//! The allocation controller: composes reputation, risk policies, vault,
//! registry, and settlement behind one facade.
//!
//! Policy objects are injected at construction from an explicit
//! configuration struct; there is no ambient global state. The engine owns
//! the per-asset exposure running totals the stateless exposure policy
//! needs, and the per-record draw map used to unwind them when a record
//! reaches a terminal state.

use mandate_core::config::EngineConfig;
use mandate_core::error::{MandateError, Result};
use mandate_core::math::mul_bps_floor;
use mandate_core::traits::{CapabilityAdapter, PriceOracle};
use mandate_core::types::{Amount, Bps, Pnl, RightsId, Role, UnixTime};
use mandate_registry::{MintRequest, RightsRecord, RightsRegistry};
use mandate_reputation::{ReputationManager, Tier, TierTable};
use mandate_risk::{BreakerState, CircuitBreaker, ExposureManager, UtilizationController};
use mandate_settlement::{dispose_stake, SettlementBreakdown, SettlementEngine};
use mandate_vault::{CapitalVault, InsuranceFund};
use std::collections::HashMap;

/// The composed mandate engine.
pub struct MandateEngine {
    reputation: ReputationManager,
    registry: RightsRegistry,
    vault: CapitalVault,
    exposure: ExposureManager,
    breaker: CircuitBreaker,
    settlement: SettlementEngine,
    insurance: InsuranceFund,
    /// Running allocated total per asset, fed to the exposure policy.
    asset_exposure: HashMap<String, Amount>,
    /// Per-record draw map, unwound when the record terminates.
    draws: HashMap<RightsId, HashMap<String, Amount>>,
}

impl MandateEngine {
    /// Builds an engine from a validated configuration.
    ///
    /// # Errors
    /// `InvalidConfig` if any section fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reputation: ReputationManager::new(TierTable::new(config.tiers.clone())?),
            registry: RightsRegistry::new(config.mandate.clone()),
            vault: CapitalVault::new(UtilizationController::new(
                config.utilization.max_utilization_bps,
            )?),
            exposure: ExposureManager::new(config.exposure.max_single_asset_bps)?,
            breaker: CircuitBreaker::new(config.breaker.max_daily_loss_bps),
            settlement: SettlementEngine::new(config.settlement.clone()),
            insurance: InsuranceFund::new(),
            asset_exposure: HashMap::new(),
            draws: HashMap::new(),
        })
    }

    // ==================== Pool Facade ====================

    /// Credits deposited capital to the pool.
    pub fn deposit(&mut self, amount: Amount) {
        self.vault.deposit(amount);
    }

    /// Withdraws pooled capital, subject to the utilization policy.
    ///
    /// # Errors
    /// `WithdrawalBlocked` per the vault's gates.
    pub fn withdraw(&mut self, amount: Amount) -> Result<()> {
        self.vault.withdraw(amount)
    }

    // ==================== Rights Lifecycle ====================

    /// Mints a new rights record after tier, duration, stake, and breaker
    /// validation.
    ///
    /// # Errors
    /// See [`RightsRegistry::mint`].
    pub fn mint(&mut self, request: MintRequest, now: UnixTime) -> Result<RightsId> {
        self.registry
            .mint(&self.reputation, Some(&self.breaker), request, now)
    }

    /// Draws capital against a record and commits it to an asset.
    ///
    /// Enforces, in order: record validity, the asset allowlist, the
    /// capital-limit headroom, the per-position size bound, the single-asset
    /// exposure cap, then the vault's breaker and utilization gates.
    ///
    /// # Errors
    /// `RightsNotActive`, `AssetNotAllowed`, `CapitalLimitExceeded`,
    /// `PositionSizeExceeded`, `ExposureCapExceeded`,
    /// `CircuitBreakerActive`, or `UtilizationCapExceeded`.
    pub fn draw(&mut self, id: RightsId, asset: &str, amount: Amount, now: UnixTime) -> Result<()> {
        let record = self
            .registry
            .get(id)
            .ok_or(MandateError::RightsNotFound { id })?;
        if !record.is_active() || record.is_expired(now) {
            return Err(MandateError::RightsNotActive { id });
        }
        if !record.constraints.allows_asset(asset) {
            return Err(MandateError::AssetNotAllowed {
                id,
                asset: asset.to_string(),
            });
        }
        let remaining = record.remaining_capital();
        if amount > remaining {
            return Err(MandateError::CapitalLimitExceeded {
                id,
                requested: amount,
                remaining,
            });
        }
        let max_position = mul_bps_floor(
            record.capital_limit,
            record.constraints.max_position_size_bps,
        );
        if amount > max_position {
            return Err(MandateError::PositionSizeExceeded {
                id,
                requested: amount,
                max: max_position,
            });
        }

        let proposed = self
            .asset_exposure
            .get(asset)
            .copied()
            .unwrap_or(0)
            .saturating_add(amount);
        if !self
            .exposure
            .can_add_exposure(proposed, self.vault.total_assets())
        {
            return Err(MandateError::ExposureCapExceeded {
                asset: asset.to_string(),
                proposed,
                total_assets: self.vault.total_assets(),
                max_bps: self.exposure.max_single_asset_bps(),
            });
        }

        self.vault.allocate(id, amount, &self.breaker)?;
        *self.asset_exposure.entry(asset.to_string()).or_insert(0) += amount;
        *self
            .draws
            .entry(id)
            .or_default()
            .entry(asset.to_string())
            .or_insert(0) += amount;
        self.registry.update_status(
            Role::AllocationController,
            id,
            Pnl::try_from(amount).unwrap_or(Pnl::MAX),
            0,
            0,
        )?;
        Ok(())
    }

    /// Applies status deltas and liquidates the record if its drawdown
    /// constraint is breached afterward. Returns true when the update
    /// triggered a liquidation.
    ///
    /// # Errors
    /// `Unauthorized` unless called as the allocation controller;
    /// `RightsNotFound`/`RightsNotActive` per the registry.
    pub fn update_status(
        &mut self,
        caller: Role,
        id: RightsId,
        deployed_delta: Pnl,
        realized_pnl_delta: Pnl,
        unrealized_pnl_delta: Pnl,
        now: UnixTime,
    ) -> Result<bool> {
        let record = self.registry.update_status(
            caller,
            id,
            deployed_delta,
            realized_pnl_delta,
            unrealized_pnl_delta,
        )?;
        if !record.drawdown_breached() {
            return Ok(false);
        }
        tracing::warn!(
            "{} drawdown {} bps breaches constraint {} bps, liquidating",
            id,
            record.status.max_drawdown_hit_bps,
            record.constraints.max_drawdown_bps
        );
        self.registry.mark_liquidated(Role::AllocationController, id)?;
        self.recover_capital(id, now);
        Ok(true)
    }

    /// Marks an elapsed record EXPIRED and recovers its capital. Callable
    /// by anyone; idempotent on repeat calls.
    ///
    /// # Errors
    /// `RightsNotFound`/`RightsNotActive` per the registry.
    pub fn mark_expired(&mut self, id: RightsId, now: UnixTime) -> Result<bool> {
        let transitioned = self.registry.mark_expired(id, now)?;
        if transitioned {
            let (returned, slashed) = self.recover_capital(id, now);
            tracing::info!(
                "{} expiry recovery: stake returned {}, slashed {}",
                id,
                returned,
                slashed
            );
        }
        Ok(transitioned)
    }

    /// Forces liquidation of an ACTIVE record. Allocation controller only.
    ///
    /// # Errors
    /// `Unauthorized` for other callers; `RightsNotFound`/`RightsNotActive`
    /// per the registry.
    pub fn mark_liquidated(&mut self, caller: Role, id: RightsId, now: UnixTime) -> Result<()> {
        self.registry.mark_liquidated(caller, id)?;
        self.recover_capital(id, now);
        Ok(())
    }

    /// Settles a record with an externally computed final PnL. Settlement
    /// authority only.
    ///
    /// # Errors
    /// See [`SettlementEngine::settle`].
    pub fn settle(
        &mut self,
        caller: Role,
        id: RightsId,
        final_pnl: Pnl,
        now: UnixTime,
    ) -> Result<SettlementBreakdown> {
        let breakdown = self.settlement.settle(
            caller,
            &mut self.registry,
            &mut self.vault,
            &mut self.breaker,
            &mut self.insurance,
            id,
            final_pnl,
            now,
        )?;
        self.clear_draws(id);
        Ok(breakdown)
    }

    /// Settles an expired record from its running status. Callable by
    /// anyone.
    ///
    /// # Errors
    /// See [`SettlementEngine::force_settle`].
    pub fn force_settle(&mut self, id: RightsId, now: UnixTime) -> Result<SettlementBreakdown> {
        let breakdown = self.settlement.force_settle(
            &mut self.registry,
            &mut self.vault,
            &mut self.breaker,
            &mut self.insurance,
            id,
            now,
        )?;
        self.clear_draws(id);
        Ok(breakdown)
    }

    // ==================== Adapter / Oracle Seams ====================

    /// Draws capital and deploys it through a capability adapter. The draw
    /// is rolled back if the adapter rejects the deployment.
    ///
    /// # Errors
    /// `AdapterNotAllowed` for adapters outside the record's allowlist, any
    /// draw error, or the adapter's own failure.
    pub async fn deploy(
        &mut self,
        id: RightsId,
        adapter: &dyn CapabilityAdapter,
        asset: &str,
        amount: Amount,
        now: UnixTime,
    ) -> Result<()> {
        let record = self
            .registry
            .get(id)
            .ok_or(MandateError::RightsNotFound { id })?;
        if !record.constraints.allows_adapter(adapter.id()) {
            return Err(MandateError::AdapterNotAllowed {
                id,
                adapter: adapter.id().to_string(),
            });
        }
        self.draw(id, asset, amount, now)?;
        if let Err(err) = adapter.deploy(asset, amount).await {
            self.undo_draw(id, asset, amount);
            return Err(err);
        }
        Ok(())
    }

    /// Unwinds a deployment through its adapter and realizes the reported
    /// PnL. Returns the realized delta; a drawdown breach during the update
    /// liquidates the record.
    ///
    /// # Errors
    /// The adapter's failure, or the status-update errors.
    pub async fn unwind(
        &mut self,
        id: RightsId,
        adapter: &dyn CapabilityAdapter,
        asset: &str,
        amount: Amount,
        now: UnixTime,
    ) -> Result<Pnl> {
        let pnl = adapter.unwind(asset, amount).await?;
        self.update_status(Role::AllocationController, id, 0, pnl, 0, now)?;
        Ok(pnl)
    }

    /// Re-marks a record's unrealized PnL from oracle valuations of its
    /// drawn positions. Returns the new unrealized PnL.
    ///
    /// # Errors
    /// `RightsNotFound` for unknown ids, oracle failures, or status-update
    /// errors.
    pub async fn sync_unrealized(
        &mut self,
        id: RightsId,
        oracle: &dyn PriceOracle,
        now: UnixTime,
    ) -> Result<Pnl> {
        let positions: Vec<(String, Amount)> = self
            .draws
            .get(&id)
            .map(|assets| assets.iter().map(|(a, v)| (a.clone(), *v)).collect())
            .unwrap_or_default();
        let record = self
            .registry
            .get(id)
            .ok_or(MandateError::RightsNotFound { id })?;
        let deployed = record.status.capital_deployed;
        let old_unrealized = record.status.unrealized_pnl;

        let mut value: Amount = 0;
        for (asset, amount) in &positions {
            value = value.saturating_add(oracle.value_of(asset, *amount).await?);
        }
        let new_unrealized =
            Pnl::try_from(value).unwrap_or(Pnl::MAX) - Pnl::try_from(deployed).unwrap_or(0);
        let delta = new_unrealized - old_unrealized;
        if delta != 0 {
            self.update_status(Role::AllocationController, id, 0, 0, delta, now)?;
        }
        Ok(new_unrealized)
    }

    // ==================== Admin Surface ====================

    /// Assigns an executor tier. Admin-only.
    ///
    /// # Errors
    /// `Unauthorized` for non-admin callers.
    pub fn set_tier(&mut self, caller: Role, executor: &str, tier: Tier) -> Result<()> {
        self.reputation.set_tier(caller, executor, tier)
    }

    /// Sets an executor's sticky ban flag. Admin-only.
    ///
    /// # Errors
    /// `Unauthorized` for non-admin callers.
    pub fn ban(&mut self, caller: Role, executor: &str, reason: &str) -> Result<()> {
        self.reputation.ban(caller, executor, reason)
    }

    /// Updates the utilization ceiling. Admin-only.
    ///
    /// # Errors
    /// `Unauthorized` or `InvalidConfig`.
    pub fn set_max_utilization(&mut self, caller: Role, bps: Bps) -> Result<()> {
        self.vault.set_max_utilization(caller, bps)
    }

    /// Updates the single-asset exposure ceiling. Admin-only.
    ///
    /// # Errors
    /// `Unauthorized` or `InvalidConfig`.
    pub fn set_max_single_asset(&mut self, caller: Role, bps: Bps) -> Result<()> {
        self.exposure.set_max_single_asset(caller, bps)
    }

    /// Forces the circuit breaker to PAUSED. Admin-only.
    ///
    /// # Errors
    /// `Unauthorized` for non-admin callers.
    pub fn emergency_pause(&mut self, caller: Role) -> Result<()> {
        self.breaker.emergency_pause(caller)
    }

    /// Clears a paused breaker. Admin-only; the only un-pause path.
    ///
    /// # Errors
    /// `Unauthorized` for non-admin callers.
    pub fn reset_breaker(&mut self, caller: Role, now: UnixTime) -> Result<()> {
        self.breaker.reset(caller, now)
    }

    // ==================== Views ====================

    #[must_use]
    pub fn rights(&self, id: RightsId) -> Option<&RightsRecord> {
        self.registry.get(id)
    }

    #[must_use]
    pub fn is_valid(&self, id: RightsId, now: UnixTime) -> bool {
        self.registry.is_valid(id, now)
    }

    #[must_use]
    pub fn is_expired(&self, id: RightsId, now: UnixTime) -> bool {
        self.registry.is_expired(id, now)
    }

    #[must_use]
    pub fn active_records(&self, executor: &str) -> Vec<&RightsRecord> {
        self.registry.active_records(executor)
    }

    /// Allocated total currently committed to one asset.
    #[must_use]
    pub fn exposure_of(&self, asset: &str) -> Amount {
        self.asset_exposure.get(asset).copied().unwrap_or(0)
    }

    #[must_use]
    pub const fn vault(&self) -> &CapitalVault {
        &self.vault
    }

    #[must_use]
    pub const fn exposure_policy(&self) -> &ExposureManager {
        &self.exposure
    }

    #[must_use]
    pub const fn insurance(&self) -> &InsuranceFund {
        &self.insurance
    }

    #[must_use]
    pub const fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    #[must_use]
    pub const fn reputation(&self) -> &ReputationManager {
        &self.reputation
    }

    #[must_use]
    pub const fn registry(&self) -> &RightsRegistry {
        &self.registry
    }

    // ==================== Internal ====================

    /// Terminal-state capital recovery: zeroes the vault allocation,
    /// returns capital plus/minus the record's running PnL to the pool,
    /// disposes the stake under the settlement tolerance rule, and unwinds
    /// the exposure bookkeeping. Returns (stake_returned, stake_slashed).
    fn recover_capital(&mut self, id: RightsId, now: UnixTime) -> (Amount, Amount) {
        let (running_pnl, staked) = self.registry.get(id).map_or((0, 0), |r| {
            (
                r.status.realized_pnl + r.status.unrealized_pnl,
                r.fees.staked_amount,
            )
        });
        self.vault.release(id);
        self.vault.apply_pnl(running_pnl);

        let loss = (-running_pnl).max(0).unsigned_abs();
        let (returned, slashed) =
            dispose_stake(staked, loss, self.settlement.config().loss_tolerance_bps);
        self.vault.credit(slashed);
        if loss > 0 {
            let uncovered = loss.saturating_sub(slashed);
            if uncovered > 0 {
                let covered = self.insurance.cover_shortfall(uncovered);
                self.vault.credit(covered);
            }
            self.breaker.record_loss(loss, self.vault.total_assets(), now);
        }
        self.clear_draws(id);
        (returned, slashed)
    }

    fn clear_draws(&mut self, id: RightsId) {
        let Some(assets) = self.draws.remove(&id) else {
            return;
        };
        for (asset, amount) in assets {
            let depleted = match self.asset_exposure.get_mut(&asset) {
                Some(exposure) => {
                    *exposure = exposure.saturating_sub(amount);
                    *exposure == 0
                }
                None => false,
            };
            if depleted {
                self.asset_exposure.remove(&asset);
            }
        }
    }

    fn undo_draw(&mut self, id: RightsId, asset: &str, amount: Amount) {
        self.vault.deallocate(id, amount);
        let depleted = match self.asset_exposure.get_mut(asset) {
            Some(exposure) => {
                *exposure = exposure.saturating_sub(amount);
                *exposure == 0
            }
            None => false,
        };
        if depleted {
            self.asset_exposure.remove(asset);
        }
        if let Some(assets) = self.draws.get_mut(&id) {
            let drained = match assets.get_mut(asset) {
                Some(drawn) => {
                    *drawn = drawn.saturating_sub(amount);
                    *drawn == 0
                }
                None => false,
            };
            if drained {
                assets.remove(asset);
            }
            if assets.is_empty() {
                self.draws.remove(&id);
            }
        }
        let _ = self.registry.update_status(
            Role::AllocationController,
            id,
            -Pnl::try_from(amount).unwrap_or(Pnl::MAX),
            0,
            0,
        );
    }
}
