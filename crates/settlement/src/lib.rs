pub mod engine;
pub mod waterfall;

pub use engine::SettlementEngine;
pub use waterfall::{compute_waterfall, dispose_stake, SettlementBreakdown, WaterfallParams};
