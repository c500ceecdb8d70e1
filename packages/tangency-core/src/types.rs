//! Core data types for the tangency portfolio pipeline.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single daily OHLC bar as delivered by a price-history provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    /// Bar timestamp (unix seconds on the wire)
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Raw price history for one ticker, column-oriented.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PriceHistory {
    pub timestamps: Vec<DateTime<Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

impl PriceHistory {
    /// Build a column-oriented history from provider bars.
    pub fn from_bars(bars: &[PriceBar]) -> Self {
        Self {
            timestamps: bars.iter().map(|b| b.timestamp).collect(),
            open: bars.iter().map(|b| b.open).collect(),
            high: bars.iter().map(|b| b.high).collect(),
            low: bars.iter().map(|b| b.low).collect(),
            close: bars.iter().map(|b| b.close).collect(),
        }
    }

    /// Number of bars in the history.
    pub fn len(&self) -> usize {
        self.close.len()
    }

    /// Whether the history holds no bars.
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Keep the closing prices and validate them into a `PriceSeries`.
    pub fn into_series(self, ticker: &str) -> Result<PriceSeries> {
        PriceSeries::new(ticker, self.timestamps, self.close)
    }
}

/// Validated closing-price series for one asset.
///
/// Invariants: at least two observations, `timestamps` and `close` have equal
/// length, and every close is finite and strictly positive.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    timestamps: Vec<DateTime<Utc>>,
    close: Vec<f64>,
}

impl PriceSeries {
    /// Create a series, checking the invariants above. The ticker is uppercased.
    pub fn new(ticker: &str, timestamps: Vec<DateTime<Utc>>, close: Vec<f64>) -> Result<Self> {
        let ticker = ticker.trim().to_uppercase();

        if close.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "{} needs at least 2 prices, got {}",
                ticker,
                close.len()
            )));
        }

        if timestamps.len() != close.len() {
            return Err(Error::MisalignedSeries {
                ticker,
                expected: close.len(),
                found: timestamps.len(),
            });
        }

        if let Some((index, &price)) = close
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(Error::InvalidPrice {
                ticker,
                index,
                price,
            });
        }

        Ok(Self {
            ticker,
            timestamps,
            close,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    /// Number of price observations.
    pub fn len(&self) -> usize {
        self.close.len()
    }

    /// Always false for a constructed series; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}

/// Annualized return statistics for one asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnStats {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Annualized volatility (decimal, e.g. 0.25 for 25%)
    pub volatility: f64,
    /// Annualized mean log return (decimal)
    pub average_return: f64,
    /// Sharpe ratio against the run's risk-free rate
    pub sharpe_ratio: f64,
}

/// One evaluated portfolio from the sampling phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSample {
    /// Weights in universe order; non-negative and summing to one
    pub weights: Vec<f64>,
    /// Annualized expected return `wᵀμ`
    pub expected_return: f64,
    /// Annualized volatility `√(wᵀΣw)`
    pub volatility: f64,
    /// Sharpe ratio
    pub sharpe: f64,
}

/// Output of one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// Tickers in the order used by `weights`
    pub tickers: Vec<String>,
    /// Refined tangency weights
    pub weights: Vec<f64>,
    /// Expected return of the refined weights
    pub expected_return: f64,
    /// Volatility of the refined weights
    pub volatility: f64,
    /// Sharpe ratio of the refined weights
    pub sharpe: f64,
    /// Risk-free rate the run was evaluated against
    pub risk_free_rate: f64,
    /// Every sampling-phase portfolio, in generation order
    pub samples: Vec<PortfolioSample>,
}

impl OptimizationResult {
    /// The refined portfolio as a sample, e.g. for frontier plotting.
    pub fn refined(&self) -> PortfolioSample {
        PortfolioSample {
            weights: self.weights.clone(),
            expected_return: self.expected_return,
            volatility: self.volatility,
            sharpe: self.sharpe,
        }
    }

    /// Best Sharpe ratio seen during the sampling phase.
    pub fn best_sampled_sharpe(&self) -> Option<f64> {
        self.samples
            .iter()
            .map(|s| s.sharpe)
            .fold(None, |best, s| match best {
                Some(b) if b >= s => Some(b),
                _ => Some(s),
            })
    }
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn days(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    #[test]
    fn test_price_series_new() {
        let series = PriceSeries::new("aapl", days(3), vec![10.0, 11.0, 12.0]).unwrap();
        assert_eq!(series.ticker(), "AAPL");
        assert_eq!(series.len(), 3);
        assert_eq!(series.close()[2], 12.0);
    }

    #[test]
    fn test_price_series_too_short() {
        let result = PriceSeries::new("AAPL", days(1), vec![10.0]);
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_price_series_length_mismatch() {
        let result = PriceSeries::new("AAPL", days(2), vec![10.0, 11.0, 12.0]);
        assert!(matches!(
            result,
            Err(Error::MisalignedSeries {
                expected: 3,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_price_series_non_positive() {
        let result = PriceSeries::new("AAPL", days(3), vec![10.0, 0.0, 12.0]);
        assert!(matches!(result, Err(Error::InvalidPrice { index: 1, .. })));

        let result = PriceSeries::new("AAPL", days(3), vec![10.0, 11.0, -1.0]);
        assert!(matches!(result, Err(Error::InvalidPrice { index: 2, .. })));
    }

    #[test]
    fn test_history_from_bars() {
        let json = r#"[
            {"timestamp": 1704153600, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5},
            {"timestamp": 1704240000, "open": 1.5, "high": 2.5, "low": 1.0, "close": 2.0}
        ]"#;
        let bars: Vec<PriceBar> = serde_json::from_str(json).unwrap();
        let history = PriceHistory::from_bars(&bars);

        assert_eq!(history.len(), 2);
        assert_eq!(history.close, vec![1.5, 2.0]);
        assert_eq!(history.timestamps[0].timestamp(), 1704153600);

        let series = history.into_series("msft").unwrap();
        assert_eq!(series.ticker(), "MSFT");
    }

    #[test]
    fn test_best_sampled_sharpe() {
        let sample = |sharpe| PortfolioSample {
            weights: vec![1.0],
            expected_return: 0.1,
            volatility: 0.2,
            sharpe,
        };
        let result = OptimizationResult {
            tickers: vec!["A".to_string()],
            weights: vec![1.0],
            expected_return: 0.1,
            volatility: 0.2,
            sharpe: 0.5,
            risk_free_rate: 0.0,
            samples: vec![sample(0.1), sample(0.7), sample(0.3)],
        };
        assert_eq!(result.best_sampled_sharpe(), Some(0.7));
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
