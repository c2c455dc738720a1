//! Agent outcomes feed CLI
//!
//! Runs the simulated agent feed live in the terminal or headless.

use agent_outcomes_feed::display::format_price;
use agent_outcomes_feed::prices::{CoinGeckoSource, PriceSource};
use agent_outcomes_feed::{Error, FeedConfig, FeedRunner, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "agent-feed")]
#[command(about = "Simulated AI agent outcomes feed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the feed in real time
    Run {
        /// Stop after this many seconds (runs until Ctrl-C otherwise)
        #[arg(short, long)]
        duration_secs: Option<u64>,

        /// Seed for a reproducible feed
        #[arg(long)]
        seed: Option<u64>,

        /// Number of rows in the feed
        #[arg(short, long)]
        rows: Option<usize>,

        /// Skip the closing price lookup
        #[arg(long)]
        no_prices: bool,

        /// Print the feed whenever it changes
        #[arg(long)]
        render: bool,
    },

    /// Run simulated time headless and print the result as JSON
    Simulate {
        /// Simulated milliseconds to run
        #[arg(short, long, default_value_t = 60_000)]
        duration_ms: u64,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(short, long)]
        rows: Option<usize>,
    },

    /// Fetch current closing prices once and print them
    Prices,

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    let mut config = match &cli.config {
        Some(path) => FeedConfig::from_file(path)?,
        None => FeedConfig::default(),
    };
    config.apply_env();

    match cli.command {
        Commands::Run {
            duration_secs,
            seed,
            rows,
            no_prices,
            render,
        } => {
            if duration_secs == Some(0) {
                return Err(Error::InvalidArgument("--duration-secs must be positive".to_string()));
            }
            override_config(&mut config, seed, rows);
            if no_prices {
                config.prices.enabled = false;
            }
            config.validate()?;
            run_feed(config, duration_secs.map(Duration::from_secs), render).await?;
        }
        Commands::Simulate {
            duration_ms,
            seed,
            rows,
        } => {
            override_config(&mut config, seed, rows);
            config.validate()?;
            let summary = FeedRunner::new(config)?.run_headless(duration_ms);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Prices => {
            config.validate()?;
            let source = CoinGeckoSource::new(&config.prices)?;
            let book = source.fetch().await?;
            for (symbol, price) in book.entries() {
                println!("{:<11} {}", symbol.market_pair(), format_price(price));
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn override_config(config: &mut FeedConfig, seed: Option<u64>, rows: Option<usize>) {
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    if let Some(rows) = rows {
        config.row_cap = rows;
    }
}

async fn run_feed(config: FeedConfig, duration: Option<Duration>, render: bool) -> Result<()> {
    tracing::info!(
        rows = config.row_cap,
        seed = ?config.seed,
        prices = config.prices.enabled,
        "Starting agent feed"
    );

    let mut runner = FeedRunner::new(config.clone())?.with_render(render);
    if config.prices.enabled {
        match CoinGeckoSource::new(&config.prices) {
            Ok(source) => runner = runner.with_price_source(Arc::new(source)),
            Err(e) => tracing::warn!(error = %e, "Price source unavailable, closing prices disabled"),
        }
    }

    let summary = runner.run(duration).await?;
    if !render {
        println!("{}", serde_json::to_string_pretty(&summary.tally)?);
    }
    Ok(())
}
