//! Daily-loss circuit breaker.
//!
//! NORMAL ⇄ PAUSED state machine over a rolling daily realized-loss
//! accumulator. The loss window resets when the day rolls over, but a
//! PAUSED state never clears itself: un-pausing requires an explicit admin
//! reset, so no loss event can silently self-heal during the same bad day.

use mandate_core::error::{MandateError, Result};
use mandate_core::math::{day_bucket, BPS_DENOM};
use mandate_core::types::{Amount, Bps, Role, UnixTime};
use serde::{Deserialize, Serialize};

/// Breaker position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakerState {
    Normal,
    Paused,
}

/// Tracks accumulated daily realized loss against a total-assets snapshot
/// and trips once the loss ratio exceeds the configured threshold
/// (default 5%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreaker {
    max_daily_loss_bps: Bps,
    daily_loss_accumulated: Amount,
    window_start: UnixTime,
    paused: bool,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(max_daily_loss_bps: Bps) -> Self {
        Self {
            max_daily_loss_bps,
            daily_loss_accumulated: 0,
            window_start: 0,
            paused: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> BreakerState {
        if self.paused {
            BreakerState::Paused
        } else {
            BreakerState::Normal
        }
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Loss accumulated in the current day window.
    #[must_use]
    pub const fn daily_loss(&self) -> Amount {
        self.daily_loss_accumulated
    }

    #[must_use]
    pub const fn window_start(&self) -> UnixTime {
        self.window_start
    }

    /// Fails with `CircuitBreakerActive` while paused.
    ///
    /// # Errors
    /// `CircuitBreakerActive` when the breaker is PAUSED.
    pub fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            return Err(MandateError::CircuitBreakerActive);
        }
        Ok(())
    }

    /// Reports a realized loss against the current day window.
    ///
    /// Rolls the window first if the day boundary has passed (resetting the
    /// accumulator, never the paused flag). Trips to PAUSED once
    /// `daily_loss * 10000 > snapshot * max_daily_loss_bps`.
    ///
    /// Returns true if the breaker is paused after this report.
    pub fn record_loss(
        &mut self,
        loss: Amount,
        total_assets_snapshot: Amount,
        now: UnixTime,
    ) -> bool {
        let bucket = day_bucket(now);
        if bucket > self.window_start {
            self.window_start = bucket;
            self.daily_loss_accumulated = 0;
        }
        self.daily_loss_accumulated = self.daily_loss_accumulated.saturating_add(loss);

        if !self.paused
            && self.daily_loss_accumulated.saturating_mul(BPS_DENOM)
                > total_assets_snapshot.saturating_mul(u128::from(self.max_daily_loss_bps))
        {
            self.paused = true;
            tracing::warn!(
                "circuit breaker tripped: daily loss {} against assets {}",
                self.daily_loss_accumulated,
                total_assets_snapshot
            );
        }
        self.paused
    }

    /// Forces PAUSED regardless of accumulated loss. Admin-only.
    ///
    /// # Errors
    /// `Unauthorized` for non-admin callers.
    pub fn emergency_pause(&mut self, caller: Role) -> Result<()> {
        if caller != Role::Admin {
            return Err(MandateError::unauthorized("Admin"));
        }
        self.paused = true;
        tracing::warn!("circuit breaker paused by admin override");
        Ok(())
    }

    /// Clears the paused state and restarts the loss window. Admin-only;
    /// this is the only un-pause path.
    ///
    /// # Errors
    /// `Unauthorized` for non-admin callers.
    pub fn reset(&mut self, caller: Role, now: UnixTime) -> Result<()> {
        if caller != Role::Admin {
            return Err(MandateError::unauthorized("Admin"));
        }
        self.paused = false;
        self.daily_loss_accumulated = 0;
        self.window_start = day_bucket(now);
        tracing::info!("circuit breaker reset");
        Ok(())
    }
}
