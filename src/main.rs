//! Crowd Consensus Engine CLI
//!
//! Usage:
//!   crowd-consensus evaluate --input traders.json --market-price 42
//!   crowd-consensus kelly --price 63 --gravity 0.2 --side no
//!   crowd-consensus hedge --yes 8 --no 79 --budget 2.50
//!   crowd-consensus demo --traders 25 --seed 7

use clap::{Parser, Subcommand, ValueEnum};
use crowd_consensus::{
    aggregation::EntropyTargetSolver,
    betting::{basic_kelly, hedge, BasicKellyConfig, BasicKellyInput},
    config::{Config, EngineConfig, Mode, Preset},
    types::{load_traders, BetSide, MarketInput, Sentiment, Trader},
    ConsensusEngine,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "crowd-consensus")]
#[command(about = "Trader consensus, calibration and Kelly sizing for prediction markets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "consensus.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a JSON list of traders against a market price
    Evaluate {
        /// JSON file with an array of traders
        #[arg(short, long)]
        input: PathBuf,
        /// YES price in cents (0-100)
        #[arg(short, long)]
        market_price: Option<f64>,
        #[arg(short, long)]
        bankroll: Option<Decimal>,
        /// Age of the trader snapshot in days
        #[arg(long)]
        age_days: Option<f64>,
        /// Solve the softmax temperature for this normalized entropy instead
        /// of using the heuristic
        #[arg(long)]
        target_entropy: Option<f64>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Standalone quarter-Kelly calculator on a gravity score
    Kelly {
        /// YES price in cents (0-100)
        #[arg(short, long)]
        price: f64,
        /// Consensus score in [-1, 1]
        #[arg(short, long)]
        gravity: f64,
        #[arg(short, long)]
        bankroll: Option<Decimal>,
        #[arg(short, long, value_enum, default_value = "yes")]
        side: SideArg,
    },
    /// Split a budget across YES and NO
    Hedge {
        /// YES price in cents
        #[arg(long)]
        yes: Decimal,
        /// NO price in cents
        #[arg(long)]
        no: Decimal,
        #[arg(long)]
        budget: Decimal,
    },
    /// Evaluate a random trader pool
    Demo {
        #[arg(short, long, default_value = "20")]
        traders: usize,
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// YES price in cents; random if omitted
        #[arg(short, long)]
        market_price: Option<f64>,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(clap::Args)]
struct EngineArgs {
    /// Start from a named preset instead of the config file
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,
    /// Apply the classic/advanced toggles
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    Gravity,
    Bayesian,
    Classic,
    Advanced,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Classic,
    Advanced,
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Yes,
    No,
}

impl EngineArgs {
    fn resolve(&self, base: &EngineConfig) -> EngineConfig {
        let mut cfg = match self.preset {
            Some(PresetArg::Gravity) => EngineConfig::preset(Preset::Gravity),
            Some(PresetArg::Bayesian) => EngineConfig::preset(Preset::Bayesian),
            Some(PresetArg::Classic) => EngineConfig::preset(Preset::Classic),
            Some(PresetArg::Advanced) => EngineConfig::preset(Preset::Advanced),
            None => base.clone(),
        };
        if let Some(mode) = self.mode {
            cfg = cfg.with_mode(match mode {
                ModeArg::Classic => Mode::Classic,
                ModeArg::Advanced => Mode::Advanced,
            });
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Evaluate {
            input,
            market_price,
            bankroll,
            age_days,
            target_entropy,
            engine,
        } => {
            let traders = load_traders(&input)?;
            let mut market = MarketInput::new(
                market_price.unwrap_or(config.defaults.market_price),
                bankroll.unwrap_or(config.defaults.bankroll),
            );
            market.data_age_days = age_days;
            evaluate(&config, &engine, &traders, &market, target_entropy).await
        }
        Commands::Kelly {
            price,
            gravity,
            bankroll,
            side,
        } => {
            let input = BasicKellyInput {
                market_price_cents: price,
                gravity_score: gravity,
                bankroll: bankroll.unwrap_or(config.defaults.bankroll),
                bet_type: match side {
                    SideArg::Yes => BetSide::Yes,
                    SideArg::No => BetSide::No,
                },
            };
            print_json(&basic_kelly(&input, &BasicKellyConfig::default()))
        }
        Commands::Hedge { yes, no, budget } => print_json(&hedge(yes, no, budget)?),
        Commands::Demo {
            traders,
            seed,
            market_price,
            engine,
        } => {
            let mut rng = StdRng::seed_from_u64(seed);
            let pool = random_pool(&mut rng, traders);
            let price = market_price.unwrap_or_else(|| rng.random_range(5.0..95.0));
            tracing::info!(traders, seed, price, "Generated demo pool");

            let market = MarketInput::new(price, config.defaults.bankroll);
            evaluate(&config, &engine, &pool, &market, None).await
        }
    }
}

async fn evaluate(
    config: &Config,
    args: &EngineArgs,
    traders: &[Trader],
    market: &MarketInput,
    target_entropy: Option<f64>,
) -> anyhow::Result<()> {
    let engine = ConsensusEngine::new(args.resolve(&config.engine))?;
    tracing::info!(
        mode = ?engine.config().mode,
        traders = traders.len(),
        market_price = market.market_price,
        "Evaluating consensus"
    );

    let report = match target_entropy {
        Some(target) => {
            let solver = EntropyTargetSolver::new(target);
            engine.evaluate_with_solver(traders, market, &solver).await?
        }
        None => engine.evaluate(traders, market),
    };

    if report.betting.should_bet {
        tracing::info!(
            side = %report.betting.bet_side,
            size = %report.betting.recommended_bet_size,
            "Bet recommended"
        );
    }
    print_json(&report)
}

fn random_pool(rng: &mut StdRng, n: usize) -> Vec<Trader> {
    (0..n)
        .map(|i| {
            let sentiment = if rng.random_bool(0.5) {
                Sentiment::Yes
            } else {
                Sentiment::No
            };
            Trader::new(
                sentiment,
                rng.random_range(-100.0..=100.0),
                rng.random_range(10.0..10_000.0),
            )
            .with_name(format!("trader-{}", i + 1))
            .with_entry_price(rng.random_range(0.05..0.95))
            .with_pnl(
                rng.random_range(-5_000.0..5_000.0),
                rng.random_range(-2_000.0..2_000.0),
            )
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
