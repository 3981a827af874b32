pub mod config;
pub mod config_loader;
pub mod error;
pub mod math;
pub mod traits;
pub mod types;

pub use config::{
    BreakerConfig, EngineConfig, ExposureConfig, MandateConfig, SettlementConfig, TierConfig,
    UtilizationConfig, TIER_COUNT,
};
pub use config_loader::ConfigLoader;
pub use error::{ErrorKind, MandateError, Result};
pub use traits::{CapabilityAdapter, PriceOracle};
pub use types::{Amount, Bps, LifecycleState, Pnl, RightsId, Role, UnixTime};
