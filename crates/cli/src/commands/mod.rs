//! CLI commands for the mandate engine.

pub mod simulate;
pub mod tiers;
pub mod validate;

use mandate_core::types::{Amount, Pnl};
use rust_decimal::Decimal;

/// Renders a smallest-unit amount as a 6-decimal quantity.
pub fn fmt_amount(amount: Amount) -> Decimal {
    Decimal::from_i128_with_scale(i128::try_from(amount).unwrap_or(i128::MAX), 6)
}

/// Renders a signed smallest-unit amount as a 6-decimal quantity.
pub fn fmt_pnl(pnl: Pnl) -> Decimal {
    Decimal::from_i128_with_scale(pnl, 6)
}
