//! Deterministic in-memory lifecycle: deposit, mint, draw, PnL update,
//! settle, with the resulting waterfall printed.

use super::{fmt_amount, fmt_pnl};
use anyhow::{Context, Result};
use chrono::Utc;
use mandate_core::math::mul_bps_ceil;
use mandate_core::types::{Amount, Pnl, Role};
use mandate_core::ConfigLoader;
use mandate_engine::{MandateEngine, MintRequest, Tier};
use mandate_registry::{FeeTerms, RightsConstraints};

const DAY: i64 = 86_400;

/// Runs the scenario and prints the settlement breakdown.
///
/// # Errors
/// Returns an error if the config is invalid or any engine step refuses the
/// scenario parameters.
pub fn run(config_path: &str, pool: Amount, capital: Amount, pnl: Pnl) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let tier_config = config.tiers[Tier::Verified.ordinal()].clone();
    let stake = mul_bps_ceil(capital, tier_config.stake_required_bps);

    let mut engine = MandateEngine::new(config)?;
    let t0 = Utc::now().timestamp();

    engine.deposit(pool);
    engine
        .set_tier(Role::Admin, "executor-1", Tier::Verified)
        .context("tier assignment")?;

    let id = engine
        .mint(
            MintRequest {
                executor: "executor-1".to_string(),
                capital_limit: capital,
                duration_secs: 7 * DAY,
                constraints: RightsConstraints {
                    max_leverage: 1,
                    max_drawdown_bps: tier_config.max_drawdown_bps,
                    max_position_size_bps: 5000,
                    allowed_adapters: vec![],
                    allowed_assets: vec![],
                },
                fees: FeeTerms {
                    base_fee_apr_bps: 200,
                    profit_share_bps: 2000,
                    staked_amount: stake,
                },
                stake_posted: stake,
            },
            t0,
        )
        .context("mint")?;
    println!("minted {id}: capital {} / stake {}", fmt_amount(capital), fmt_amount(stake));

    let draw = capital / 4;
    engine.draw(id, "SOL", draw, t0 + 1).context("draw SOL")?;
    engine.draw(id, "ETH", draw, t0 + 2).context("draw ETH")?;
    println!(
        "drew {} across 2 assets, pool utilization {} bps",
        fmt_amount(draw * 2),
        engine.vault().utilization_bps()
    );

    let liquidated = engine
        .update_status(Role::AllocationController, id, 0, pnl, 0, t0 + 3 * DAY)
        .context("status update")?;
    if liquidated {
        println!("record liquidated on drawdown breach; no settlement to run");
        return Ok(());
    }

    let breakdown = engine
        .settle(Role::SettlementAuthority, id, pnl, t0 + 7 * DAY)
        .context("settlement")?;

    println!("settled {id} with final pnl {}", fmt_pnl(breakdown.final_pnl));
    println!("  lp base fee:     {}", fmt_amount(breakdown.lp_base_fee));
    println!("  lp profit share: {}", fmt_amount(breakdown.lp_profit_share));
    println!("  insurance fee:   {}", fmt_amount(breakdown.insurance_fee));
    println!("  executor profit: {}", fmt_amount(breakdown.executor_profit));
    println!("  stake returned:  {}", fmt_amount(breakdown.stake_returned));
    println!("  stake slashed:   {}", fmt_amount(breakdown.stake_slashed));
    println!(
        "pool {} / insurance {} / coverage {} bps",
        fmt_amount(engine.vault().total_assets()),
        fmt_amount(engine.insurance().balance()),
        engine.insurance().coverage_ratio_bps(engine.vault().total_assets())
    );
    println!("{}", serde_json::to_string_pretty(&breakdown)?);
    Ok(())
}
