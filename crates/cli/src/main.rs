use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mandate")]
#[command(about = "Pooled-capital mandate engine operator tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the engine configuration
    ValidateConfig {
        /// Config file path
        #[arg(short, long, default_value = "config/Mandate.toml")]
        config: String,
    },
    /// Print the configured tier limit table
    Tiers {
        /// Config file path
        #[arg(short, long, default_value = "config/Mandate.toml")]
        config: String,
    },
    /// Run a deterministic in-memory mandate lifecycle and print the
    /// settlement breakdown
    Simulate {
        /// Config file path
        #[arg(short, long, default_value = "config/Mandate.toml")]
        config: String,
        /// Pool size in smallest units
        #[arg(long, default_value_t = 10_000_000_000_000)]
        pool: u64,
        /// Rights record capital limit in smallest units
        #[arg(long, default_value_t = 1_000_000_000_000)]
        capital: u64,
        /// Final PnL to settle with, in smallest units
        #[arg(long, default_value_t = 50_000_000_000, allow_hyphen_values = true)]
        pnl: i64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::ValidateConfig { config } => {
            commands::validate::run(&config)?;
        }
        Commands::Tiers { config } => {
            commands::tiers::run(&config)?;
        }
        Commands::Simulate {
            config,
            pool,
            capital,
            pnl,
        } => {
            commands::simulate::run(&config, u128::from(pool), u128::from(capital), i128::from(pnl))?;
        }
    }

    Ok(())
}
