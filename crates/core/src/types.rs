use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger amounts in smallest units (e.g. 6-decimal USDC atoms).
pub type Amount = u128;

/// Signed profit/loss in the same smallest units as [`Amount`].
pub type Pnl = i128;

/// Basis points (1/100 of a percent). 10000 bps = 100%.
pub type Bps = u32;

/// Unix timestamp in seconds.
pub type UnixTime = i64;

/// Identifier of a rights record. Allocated monotonically by the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RightsId(pub u64);

impl fmt::Display for RightsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERT-{}", self.0)
    }
}

/// Role attached to a caller of a guarded operation.
///
/// The core performs no authentication; the embedding application maps its
/// own identities onto these roles before calling in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Administrative identity: tier changes, bans, cap changes, breaker control.
    Admin,
    /// The allocation controller: capital draws, status updates, liquidation.
    AllocationController,
    /// The settlement authority: normal settlement with an externally computed PnL.
    SettlementAuthority,
    /// Unprivileged caller: read views, `mark_expired`, `force_settle`.
    Public,
}

/// Lifecycle state of a rights record.
///
/// PENDING exists only within the mint call itself; a record is never
/// observable in PENDING. All states other than ACTIVE are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Pending,
    Active,
    Settled,
    Expired,
    Liquidated,
}

impl LifecycleState {
    /// Returns true for states a record can never leave.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Expired | Self::Liquidated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Settled => "SETTLED",
            Self::Expired => "EXPIRED",
            Self::Liquidated => "LIQUIDATED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!LifecycleState::Pending.is_terminal());
        assert!(!LifecycleState::Active.is_terminal());
        assert!(LifecycleState::Settled.is_terminal());
        assert!(LifecycleState::Expired.is_terminal());
        assert!(LifecycleState::Liquidated.is_terminal());
    }

    #[test]
    fn rights_id_display() {
        assert_eq!(RightsId(7).to_string(), "ERT-7");
    }

    #[test]
    fn rights_id_serde_transparent() {
        let json = serde_json::to_string(&RightsId(42)).unwrap();
        assert_eq!(json, "42");
        let id: RightsId = serde_json::from_str("42").unwrap();
        assert_eq!(id, RightsId(42));
    }
}
