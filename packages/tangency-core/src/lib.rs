//! Tangency Core - Maximum-Sharpe portfolio construction library.
//!
//! This crate turns daily closing prices for a small basket of equities into a
//! risk-efficient portfolio:
//!
//! - **Return statistics**: log returns, annualized mean, volatility and Sharpe ratio
//! - **Covariance**: annualized sample covariance across assets
//! - **Optimizer**: random weight search followed by gradient ascent on the Sharpe ratio
//! - **Frontier**: efficient-frontier envelope, polynomial smoothing, capital allocation line
//!
//! Price data, fundamentals and the risk-free rate come from collaborators behind
//! the traits in [`providers`]; the optimization pipeline itself performs no I/O.
//! [`providers::JsonDirectoryProvider`] reads saved provider responses from disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use rand::SeedableRng;
//! use tangency_core::{optimize, Config, IncompletePolicy, Universe};
//! use tangency_core::providers::JsonDirectoryProvider;
//!
//! let provider = JsonDirectoryProvider::new("data");
//! let tickers = vec!["AAPL".to_string(), "MSFT".to_string()];
//! let universe = Universe::fetch(&provider, &tickers, IncompletePolicy::Exclude).unwrap();
//!
//! let config = Config::default();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let analysis = optimize(&universe, 0.01, &config, &mut rng).unwrap();
//! println!("weights: {:?}", analysis.result.weights);
//! ```

pub mod allocation;
pub mod chart;
pub mod config;
pub mod frontier;
pub mod matrix;
pub mod optimizer;
pub mod providers;
pub mod stats;
pub mod summary;
pub mod types;
pub mod universe;

use rand::Rng;
use serde::Serialize;

// Re-export commonly used types
pub use types::{
    ApiResponse, OptimizationResult, PortfolioSample, PriceBar, PriceHistory, PriceSeries,
    ReturnStats,
};

// Re-export main functionality
pub use allocation::{dollar_allocation, indexed_growth, DollarAllocation, GrowthIndex};
pub use chart::{ChartData, JsonSink};
pub use config::{Config, FrontierConfig, OptimizerConfig, WeightScheme};
pub use frontier::{BucketEnvelope, Curve, Frontier, PolynomialFit};
pub use matrix::{solve, Matrix};
pub use optimizer::PortfolioOptimizer;
pub use stats::{log_returns, CovarianceMatrix, TRADING_DAYS};
pub use providers::{
    FundamentalsProvider, PriceHistoryProvider, RenderSink, RiskFreeRateProvider,
};
pub use summary::{AssetCard, Fundamentals, Metric, Rating};
pub use universe::{IncompletePolicy, Universe};

/// Error types for tangency-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid price for {ticker} at index {index}: {price}")]
    InvalidPrice {
        ticker: String,
        index: usize,
        price: f64,
    },

    #[error("Misaligned series: {ticker} has {found} observations, expected {expected}")]
    MisalignedSeries {
        ticker: String,
        expected: usize,
        found: usize,
    },

    #[error("Dimension mismatch: cannot combine {left:?} with {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Singular matrix: zero pivot in column {0}")]
    SingularMatrix(usize),

    #[error("Zero volatility: {0}")]
    ZeroVolatility(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
}

/// Result type for tangency-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything one optimization run produces, passed forward to renderers.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Per-asset statistics, in universe order
    pub stats: Vec<ReturnStats>,
    /// Annualized covariance matrix
    pub covariance: CovarianceMatrix,
    /// Refined tangency weights and the full sample cloud
    pub result: OptimizationResult,
    /// Frontier envelope and capital allocation line
    pub frontier: Frontier,
}

/// Run the full pipeline over a prepared universe.
///
/// # Arguments
///
/// * `universe` - Aligned price series, one per ticker
/// * `risk_free_rate` - Annual risk-free rate in decimal form (0.01 for 1%)
/// * `config` - Optimizer and frontier settings
/// * `rng` - Random source for the sampling phase
///
/// # Returns
///
/// The per-asset statistics, the covariance matrix, the optimization result and
/// the extracted frontier. Any stage error aborts the whole run.
pub fn optimize<R: Rng + ?Sized>(
    universe: &Universe,
    risk_free_rate: f64,
    config: &Config,
    rng: &mut R,
) -> Result<Analysis> {
    config.validate()?;
    if !risk_free_rate.is_finite() {
        return Err(Error::InvalidInput(format!(
            "risk-free rate must be finite, got {}",
            risk_free_rate
        )));
    }

    tracing::info!(
        assets = universe.len(),
        simulations = config.optimizer.num_simulations,
        risk_free_rate,
        "Starting optimization run"
    );

    let stats = universe
        .series()
        .iter()
        .map(|s| ReturnStats::from_series(s, risk_free_rate))
        .collect::<Result<Vec<_>>>()?;

    let covariance = CovarianceMatrix::estimate(universe.series())?;
    let means: Vec<f64> = stats.iter().map(|s| s.average_return).collect();

    let optimizer = PortfolioOptimizer::new(
        universe.tickers(),
        means,
        covariance.clone(),
        risk_free_rate,
        config.optimizer.clone(),
    )?;
    let result = optimizer.run(rng)?;
    let frontier = Frontier::from_result(&result)?;

    tracing::info!(
        sharpe = result.sharpe,
        expected_return = result.expected_return,
        volatility = result.volatility,
        "Optimization run finished"
    );

    Ok(Analysis {
        stats,
        covariance,
        result,
        frontier,
    })
}
