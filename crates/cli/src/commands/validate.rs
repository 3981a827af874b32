use anyhow::Result;
use mandate_core::ConfigLoader;

/// Loads the configuration and reports the validated limits.
///
/// # Errors
/// Returns an error if the config cannot be read, parsed, or validated.
pub fn run(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;

    println!("configuration OK");
    println!(
        "  max utilization:      {} bps",
        config.utilization.max_utilization_bps
    );
    println!(
        "  max single asset:     {} bps",
        config.exposure.max_single_asset_bps
    );
    println!(
        "  max daily loss:       {} bps",
        config.breaker.max_daily_loss_bps
    );
    println!(
        "  duration bounds:      {}s .. {}s",
        config.mandate.min_duration_secs, config.mandate.max_duration_secs
    );
    println!(
        "  insurance fee:        {} bps",
        config.settlement.insurance_fee_bps
    );
    println!(
        "  stake loss tolerance: {} bps",
        config.settlement.loss_tolerance_bps
    );
    println!("  tiers:                {}", config.tiers.len());
    Ok(())
}
