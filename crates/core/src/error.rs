//! Error types for the mandate engine.
//!
//! Every failure surfaces to the caller; the core never retries. Each error
//! classifies into one of four kinds so callers can decide whether retrying
//! with different parameters or at a later time can ever succeed.

use crate::types::{Amount, Bps, RightsId, UnixTime};
use thiserror::Error;

/// Coarse classification of engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tier/capital/drawdown/risk/duration/stake mismatch. Retrying with the
    /// same parameters will always fail the same way.
    PolicyViolation,
    /// A global safety gate (breaker, utilization, exposure) refused the
    /// operation. May legitimately succeed later once global state changes.
    SafetyHalt,
    /// The record is not in the lifecycle state the operation requires.
    StateConflict,
    /// The caller lacks the required role.
    AccessViolation,
}

/// Errors produced by the mandate engine.
#[derive(Debug, Error)]
pub enum MandateError {
    /// The executor carries a sticky ban flag.
    #[error("executor banned: {executor}")]
    ExecutorBanned {
        /// Banned executor identity.
        executor: String,
    },

    /// Requested capital limit exceeds the executor tier's maximum.
    #[error("capital limit {requested} exceeds tier maximum {tier_max}")]
    CapitalExceedsTierLimit {
        /// Requested capital limit.
        requested: Amount,
        /// Tier ceiling.
        tier_max: Amount,
    },

    /// Requested drawdown constraint exceeds the tier ceiling.
    #[error("max drawdown {requested_bps} bps exceeds tier ceiling {tier_max_bps} bps")]
    DrawdownExceedsTierLimit {
        /// Requested drawdown bound.
        requested_bps: Bps,
        /// Tier ceiling.
        tier_max_bps: Bps,
    },

    /// Requested leverage exceeds the tier's risk-level ceiling.
    #[error("leverage {requested}x exceeds tier ceiling {tier_max}x")]
    RiskLevelExceedsTierLimit {
        /// Requested leverage multiplier.
        requested: u32,
        /// Tier ceiling.
        tier_max: u32,
    },

    /// Mandate duration below the configured minimum.
    #[error("duration {duration_secs}s below minimum {min_secs}s")]
    DurationTooShort {
        /// Requested duration.
        duration_secs: UnixTime,
        /// Configured minimum.
        min_secs: UnixTime,
    },

    /// Mandate duration above the configured maximum.
    #[error("duration {duration_secs}s above maximum {max_secs}s")]
    DurationTooLong {
        /// Requested duration.
        duration_secs: UnixTime,
        /// Configured maximum.
        max_secs: UnixTime,
    },

    /// Posted stake is below the tier-required collateral.
    #[error("insufficient stake: posted {posted}, required {required}")]
    InsufficientStake {
        /// Stake actually posted.
        posted: Amount,
        /// Required collateral.
        required: Amount,
    },

    /// The daily-loss circuit breaker is paused.
    #[error("circuit breaker active")]
    CircuitBreakerActive,

    /// The allocation would push pool utilization over the cap.
    #[error("utilization cap exceeded: {would_be_bps} bps > {max_bps} bps")]
    UtilizationCapExceeded {
        /// Utilization after the allocation, ceiling-rounded.
        would_be_bps: u128,
        /// Configured cap.
        max_bps: Bps,
    },

    /// The draw would push a single asset's share over the cap.
    #[error("exposure cap exceeded for {asset}: {proposed} of {total_assets} > {max_bps} bps")]
    ExposureCapExceeded {
        /// Asset being drawn against.
        asset: String,
        /// Proposed per-asset allocation.
        proposed: Amount,
        /// Pool total assets.
        total_assets: Amount,
        /// Configured cap.
        max_bps: Bps,
    },

    /// A pool withdrawal was refused.
    #[error("withdrawal blocked: {reason}")]
    WithdrawalBlocked {
        /// Why the withdrawal was refused.
        reason: String,
    },

    /// The record is not in the ACTIVE state the operation requires.
    #[error("rights record {id} not active")]
    RightsNotActive {
        /// Record id.
        id: RightsId,
    },

    /// No record exists under this id.
    #[error("rights record {id} not found")]
    RightsNotFound {
        /// Record id.
        id: RightsId,
    },

    /// Forced settlement requested before the record's expiry.
    #[error("rights record {id} has not expired")]
    RightsNotExpired {
        /// Record id.
        id: RightsId,
    },

    /// Draw against an asset outside the record's allowlist.
    #[error("asset {asset} not allowed for record {id}")]
    AssetNotAllowed {
        /// Record id.
        id: RightsId,
        /// Refused asset.
        asset: String,
    },

    /// Deployment through an adapter outside the record's allowlist.
    #[error("adapter {adapter} not allowed for record {id}")]
    AdapterNotAllowed {
        /// Record id.
        id: RightsId,
        /// Refused adapter.
        adapter: String,
    },

    /// Draw beyond the record's remaining capital limit.
    #[error("draw of {requested} exceeds remaining capital limit {remaining} for record {id}")]
    CapitalLimitExceeded {
        /// Record id.
        id: RightsId,
        /// Requested draw.
        requested: Amount,
        /// Limit headroom left.
        remaining: Amount,
    },

    /// Single draw beyond the record's per-position size bound.
    #[error("draw of {requested} exceeds position size limit {max} for record {id}")]
    PositionSizeExceeded {
        /// Record id.
        id: RightsId,
        /// Requested draw.
        requested: Amount,
        /// Per-position maximum.
        max: Amount,
    },

    /// Caller role does not permit the operation.
    #[error("unauthorized: {required} role required")]
    Unauthorized {
        /// Role the operation requires.
        required: String,
    },

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Price oracle failure, surfaced from the collaborator seam.
    #[error("oracle error: {0}")]
    Oracle(String),

    /// Capability adapter failure, surfaced from the collaborator seam.
    #[error("adapter error: {0}")]
    Adapter(String),
}

impl MandateError {
    /// Creates an unauthorized error naming the required role.
    pub fn unauthorized(required: impl Into<String>) -> Self {
        Self::Unauthorized {
            required: required.into(),
        }
    }

    /// Creates a banned-executor error.
    pub fn banned(executor: impl Into<String>) -> Self {
        Self::ExecutorBanned {
            executor: executor.into(),
        }
    }

    /// Creates a blocked-withdrawal error.
    pub fn withdrawal_blocked(reason: impl Into<String>) -> Self {
        Self::WithdrawalBlocked {
            reason: reason.into(),
        }
    }

    /// Creates an invalid-configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Classifies the error into the four-way taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ExecutorBanned { .. }
            | Self::CapitalExceedsTierLimit { .. }
            | Self::DrawdownExceedsTierLimit { .. }
            | Self::RiskLevelExceedsTierLimit { .. }
            | Self::DurationTooShort { .. }
            | Self::DurationTooLong { .. }
            | Self::InsufficientStake { .. }
            | Self::AssetNotAllowed { .. }
            | Self::AdapterNotAllowed { .. }
            | Self::CapitalLimitExceeded { .. }
            | Self::PositionSizeExceeded { .. }
            | Self::InvalidConfig(_) => ErrorKind::PolicyViolation,

            Self::CircuitBreakerActive
            | Self::UtilizationCapExceeded { .. }
            | Self::ExposureCapExceeded { .. }
            | Self::WithdrawalBlocked { .. }
            | Self::Oracle(_)
            | Self::Adapter(_) => ErrorKind::SafetyHalt,

            Self::RightsNotActive { .. }
            | Self::RightsNotFound { .. }
            | Self::RightsNotExpired { .. } => ErrorKind::StateConflict,

            Self::Unauthorized { .. } => ErrorKind::AccessViolation,
        }
    }

    /// Returns true when retrying later, with identical parameters, can
    /// succeed once global state changes. Only safety halts qualify.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::SafetyHalt)
    }
}

/// Result type alias for mandate engine operations.
pub type Result<T> = std::result::Result<T, MandateError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Classification Tests ====================

    #[test]
    fn policy_violations_are_not_retryable() {
        let err = MandateError::InsufficientStake {
            posted: 24,
            required: 25,
        };
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        assert!(!err.is_retryable());
    }

    #[test]
    fn safety_halts_are_retryable() {
        assert!(MandateError::CircuitBreakerActive.is_retryable());
        let err = MandateError::UtilizationCapExceeded {
            would_be_bps: 7001,
            max_bps: 7000,
        };
        assert_eq!(err.kind(), ErrorKind::SafetyHalt);
        assert!(err.is_retryable());
    }

    #[test]
    fn state_conflicts_are_fatal() {
        let err = MandateError::RightsNotActive { id: RightsId(1) };
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert!(!err.is_retryable());
    }

    #[test]
    fn access_violations_are_fatal() {
        let err = MandateError::unauthorized("Admin");
        assert_eq!(err.kind(), ErrorKind::AccessViolation);
        assert!(!err.is_retryable());
    }

    // ==================== Display Tests ====================

    #[test]
    fn display_includes_amounts() {
        let err = MandateError::InsufficientStake {
            posted: 24,
            required: 25,
        };
        let msg = err.to_string();
        assert!(msg.contains("24"));
        assert!(msg.contains("25"));
    }

    #[test]
    fn display_includes_record_id() {
        let err = MandateError::RightsNotActive { id: RightsId(9) };
        assert!(err.to_string().contains("ERT-9"));
    }
}
