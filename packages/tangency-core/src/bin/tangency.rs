//! Tangency CLI - maximum-Sharpe portfolios from saved price data.
//!
//! Results are printed to stdout as JSON `ApiResponse` envelopes; logs go to
//! stderr (filter with `RUST_LOG`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tangency_core::providers::{FixedRate, JsonDirectoryProvider};
use tangency_core::{
    dollar_allocation, indexed_growth, optimize, ApiResponse, AssetCard, ChartData, Config,
    FundamentalsProvider, IncompletePolicy, JsonSink, ReturnStats, RiskFreeRateProvider,
    Universe,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Used when no rate is given and `riskfree.json` is unusable.
const FALLBACK_RISK_FREE_RATE: f64 = 0.01;

#[derive(Parser)]
#[command(name = "tangency")]
#[command(about = "Tangency portfolio CLI - maximum-Sharpe weights and efficient frontier")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct DataArgs {
    /// Directory of saved provider responses
    #[arg(short, long)]
    data: PathBuf,
    /// Tickers to analyze (comma-separated)
    #[arg(short, long, value_delimiter = ',', required = true)]
    tickers: Vec<String>,
    /// Annual risk-free rate in decimal (0.045 = 4.5%); read from riskfree.json if omitted
    #[arg(short, long)]
    risk_free: Option<f64>,
    /// Fail instead of dropping tickers with missing or invalid history
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the tangency portfolio
    Optimize {
        #[command(flatten)]
        data: DataArgs,
        /// Amount to split across the tangency weights
        #[arg(short, long)]
        invest: Option<f64>,
        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
        /// Number of random portfolios to sample
        #[arg(long)]
        simulations: Option<usize>,
        /// Config file (defaults to the user config path)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write chart data as JSON to this path
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// Per-asset statistics and fundamentals
    Stats {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Print the effective configuration
    Config {
        /// Config file (defaults to the user config path)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Optimize {
            data,
            invest,
            seed,
            simulations,
            config,
            chart,
        } => handle_optimize(&data, invest, seed, simulations, config.as_deref(), chart.as_deref()),
        Commands::Stats { data } => handle_stats(&data),
        Commands::Config { config } => handle_config(config.as_deref()),
    };

    let (output, ok) = match result {
        Ok(data) => (serde_json::to_string_pretty(&ApiResponse::ok(data)), true),
        Err(e) => {
            tracing::error!("{:#}", e);
            (
                serde_json::to_string_pretty(&ApiResponse::<()>::err(format!("{:#}", e))),
                false,
            )
        }
    };

    match output {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("failed to encode response: {}", e);
            std::process::exit(2);
        }
    }
    if !ok {
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load_from_path(p)
            .with_context(|| format!("loading config from {}", p.display())),
        None => Config::load().context("loading default config"),
    }
}

fn risk_free_rate(args: &DataArgs, provider: &JsonDirectoryProvider) -> Result<f64> {
    if let Some(rate) = args.risk_free {
        return Ok(FixedRate(rate).risk_free_rate()?);
    }
    match provider.risk_free_rate() {
        Ok(rate) => Ok(rate),
        Err(e) => {
            tracing::warn!(
                "No risk-free rate available ({}), using {}",
                e,
                FALLBACK_RISK_FREE_RATE
            );
            Ok(FALLBACK_RISK_FREE_RATE)
        }
    }
}

fn universe(args: &DataArgs, provider: &JsonDirectoryProvider) -> Result<Universe> {
    let policy = if args.strict {
        IncompletePolicy::Reject
    } else {
        IncompletePolicy::Exclude
    };
    Universe::fetch(provider, &args.tickers, policy).context("assembling universe")
}

fn handle_optimize(
    args: &DataArgs,
    invest: Option<f64>,
    seed: Option<u64>,
    simulations: Option<usize>,
    config_path: Option<&Path>,
    chart_path: Option<&Path>,
) -> Result<Value> {
    let mut config = load_config(config_path)?;
    if let Some(seed) = seed {
        config.optimizer.seed = Some(seed);
    }
    if let Some(n) = simulations {
        config.optimizer.num_simulations = n;
    }

    let provider = JsonDirectoryProvider::new(&args.data);
    let rf = risk_free_rate(args, &provider)?;
    let universe = universe(args, &provider)?;

    let mut rng = config.optimizer.rng();
    let analysis = optimize(&universe, rf, &config, &mut rng)?;
    let result = &analysis.result;

    let allocation = invest
        .map(|amount| dollar_allocation(&result.tickers, &result.weights, amount))
        .transpose()?;

    if let Some(path) = chart_path {
        let growth = indexed_growth(universe.series(), &result.weights)?;
        let chart = ChartData::build(&analysis, Some(growth), &config.frontier)?;
        let file = File::create(path)
            .with_context(|| format!("creating chart file {}", path.display()))?;
        chart.render_to(&mut JsonSink::new(BufWriter::new(file)))?;
        tracing::info!("Chart data written to {}", path.display());
    }

    Ok(json!({
        "tickers": result.tickers,
        "weights": result.weights,
        "expectedReturn": result.expected_return,
        "volatility": result.volatility,
        "sharpe": result.sharpe,
        "riskFreeRate": result.risk_free_rate,
        "calSlope": analysis.frontier.cal_slope,
        "tangency": analysis.frontier.tangency,
        "sampleCount": result.samples.len(),
        "stats": analysis.stats,
        "covariance": analysis.covariance.to_rows(),
        "allocation": allocation,
    }))
}

fn handle_stats(args: &DataArgs) -> Result<Value> {
    let provider = JsonDirectoryProvider::new(&args.data);
    let rf = risk_free_rate(args, &provider)?;
    let universe = universe(args, &provider)?;

    let cards = universe
        .series()
        .iter()
        .map(|s| -> Result<AssetCard> {
            let stats = ReturnStats::from_series(s, rf)?;
            let fundamentals = match provider.fundamentals(s.ticker()) {
                Ok(f) => Some(f),
                Err(e) => {
                    tracing::debug!("No fundamentals for {}: {}", s.ticker(), e);
                    None
                }
            };
            Ok(AssetCard::new(stats, fundamentals))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(json!({
        "riskFreeRate": rf,
        "cards": cards,
    }))
}

fn handle_config(path: Option<&Path>) -> Result<Value> {
    let config = load_config(path)?;
    let source = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);
    Ok(json!({
        "path": source,
        "exists": source.exists(),
        "toml": config.to_toml()?,
        "config": config,
    }))
}
