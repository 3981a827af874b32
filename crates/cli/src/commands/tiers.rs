use super::fmt_amount;
use anyhow::Result;
use mandate_core::ConfigLoader;

/// Prints the tier limit table.
///
/// # Errors
/// Returns an error if the config cannot be read, parsed, or validated.
pub fn run(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;

    println!(
        "{:<14} {:>18} {:>12} {:>14} {:>10}",
        "tier", "max capital", "stake bps", "drawdown bps", "leverage"
    );
    for tier in &config.tiers {
        println!(
            "{:<14} {:>18} {:>12} {:>14} {:>9}x",
            tier.name,
            fmt_amount(tier.max_capital),
            tier.stake_required_bps,
            tier.max_drawdown_bps,
            tier.max_leverage
        );
    }
    Ok(())
}
