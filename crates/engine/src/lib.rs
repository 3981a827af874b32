pub mod engine;

pub use engine::MandateEngine;

pub use mandate_core::{EngineConfig, ErrorKind, MandateError, Result, RightsId, Role};
pub use mandate_registry::{FeeTerms, MintRequest, RightsConstraints, RightsRecord};
pub use mandate_reputation::Tier;
pub use mandate_settlement::SettlementBreakdown;
