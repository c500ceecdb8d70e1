//! Daily log returns and annualized per-asset statistics.

use super::TRADING_DAYS;
use crate::types::{PriceSeries, ReturnStats};
use crate::{Error, Result};

/// Calculate daily log returns `ln(p[i] / p[i-1])`.
///
/// # Arguments
///
/// * `close` - Closing prices, oldest first
///
/// # Returns
///
/// `close.len() - 1` returns. Fewer than two prices is `InsufficientData`; a
/// price that is not strictly positive is `InvalidPrice`.
///
/// # Example
///
/// ```rust
/// use tangency_core::stats::log_returns;
///
/// let r = log_returns(&[100.0, 110.0, 99.0]).unwrap();
/// assert_eq!(r.len(), 2);
/// assert!((r[0] - (1.1_f64).ln()).abs() < 1e-12);
/// ```
pub fn log_returns(close: &[f64]) -> Result<Vec<f64>> {
    if close.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "Need at least 2 prices for returns, got {}",
            close.len()
        )));
    }

    if let Some((index, &price)) = close
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
        return Err(Error::InvalidPrice {
            ticker: UNNAMED_SERIES.to_string(),
            index,
            price,
        });
    }

    Ok(ln_ratios(close))
}

/// Ticker reported for price errors in a bare price slice.
const UNNAMED_SERIES: &str = "<unnamed>";

/// `ln(p[i] / p[i-1])` for every adjacent pair; prices must be positive.
fn ln_ratios(close: &[f64]) -> Vec<f64> {
    close.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Sample mean and unbiased sample variance (denominator `len - 1`).
///
/// Needs at least two observations; with one the variance is undefined.
pub fn mean_and_variance(values: &[f64]) -> Result<(f64, f64)> {
    if values.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "Need at least 2 returns for a sample variance, got {}",
            values.len()
        )));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Ok((mean, variance))
}

impl PriceSeries {
    /// Daily log returns of this series. Infallible: the series invariants
    /// already guarantee two or more positive prices.
    pub fn log_returns(&self) -> Vec<f64> {
        ln_ratios(self.close())
    }
}

impl ReturnStats {
    /// Annualized statistics for one asset.
    ///
    /// # Arguments
    ///
    /// * `series` - Validated closing prices
    /// * `risk_free_rate` - Annual risk-free rate (e.g., 0.01 for 1%)
    ///
    /// # Returns
    ///
    /// `InsufficientData` for fewer than three prices (a single return has no
    /// sample variance) and `ZeroVolatility` for a flat series.
    pub fn from_series(series: &PriceSeries, risk_free_rate: f64) -> Result<Self> {
        Self::from_returns(series.ticker(), &series.log_returns(), risk_free_rate)
    }

    /// Annualized statistics from precomputed daily log returns.
    pub fn from_returns(ticker: &str, returns: &[f64], risk_free_rate: f64) -> Result<Self> {
        let (mean_daily, variance_daily) = mean_and_variance(returns)
            .map_err(|e| Error::InsufficientData(format!("{}: {}", ticker, e)))?;

        let average_return = mean_daily * TRADING_DAYS;
        let volatility = variance_daily.sqrt() * TRADING_DAYS.sqrt();

        if volatility <= 0.0 || !volatility.is_finite() {
            return Err(Error::ZeroVolatility(format!(
                "{} has no return variation",
                ticker
            )));
        }

        Ok(Self {
            ticker: ticker.to_string(),
            volatility,
            average_return,
            sharpe_ratio: (average_return - risk_free_rate) / volatility,
        })
    }
}
