pub mod expiry;
pub mod record;
pub mod registry;

pub use expiry::DailyExpiryBucket;
pub use record::{FeeTerms, RightsConstraints, RightsRecord, RightsStatus};
pub use registry::{MintRequest, RightsRegistry};
