pub mod manager;
pub mod tier;

pub use manager::{ExecutorReputation, ReputationManager};
pub use tier::{Tier, TierTable};
