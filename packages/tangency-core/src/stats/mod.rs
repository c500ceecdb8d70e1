//! Return and covariance statistics.
//!
//! Provides daily log returns, annualized per-asset statistics and the
//! annualized sample covariance matrix.

mod covariance;
mod returns;

pub use covariance::CovarianceMatrix;
pub use returns::{log_returns, mean_and_variance};

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;
