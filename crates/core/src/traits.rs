use crate::error::Result;
use crate::types::{Amount, Pnl};
use async_trait::async_trait;

/// Trusted price source used to value deployed capital for PnL marking.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Returns the current pool-currency value of `amount` units deployed
    /// into `asset`.
    async fn value_of(&self, asset: &str, amount: Amount) -> Result<Amount>;
}

/// Capability provider (swap/lend/stake/perp venue) the allocation
/// controller deploys drawn capital through.
#[async_trait]
pub trait CapabilityAdapter: Send + Sync {
    /// Stable adapter identifier, matched against a record's allowlist.
    fn id(&self) -> &str;

    /// Deploys capital into the venue.
    async fn deploy(&self, asset: &str, amount: Amount) -> Result<()>;

    /// Unwinds a deployment and reports the realized PnL delta.
    async fn unwind(&self, asset: &str, amount: Amount) -> Result<Pnl>;
}
