pub mod insurance;
pub mod vault;

pub use insurance::InsuranceFund;
pub use vault::CapitalVault;
