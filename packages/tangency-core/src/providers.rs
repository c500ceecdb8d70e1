//! Collaborator interfaces and file-backed implementations.
//!
//! The pipeline never fetches anything itself. Price histories, the
//! risk-free rate and fundamentals come in through these traits, and chart
//! data goes out through [`RenderSink`].

use crate::chart::ChartData;
use crate::summary::{FinancialDataModule, Fundamentals, StatisticsModule};
use crate::types::{PriceBar, PriceHistory};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Source of daily price history.
pub trait PriceHistoryProvider {
    fn price_history(&self, ticker: &str) -> Result<PriceHistory>;
}

/// Source of the annual risk-free rate, in decimal form.
pub trait RiskFreeRateProvider {
    fn risk_free_rate(&self) -> Result<f64>;
}

/// Source of per-ticker fundamentals.
pub trait FundamentalsProvider {
    fn fundamentals(&self, ticker: &str) -> Result<Fundamentals>;
}

/// Consumer of finished chart data.
pub trait RenderSink {
    fn render(&mut self, chart: &ChartData) -> Result<()>;
}

/// A fixed risk-free rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRate(pub f64);

impl RiskFreeRateProvider for FixedRate {
    fn risk_free_rate(&self) -> Result<f64> {
        if self.0.is_finite() {
            Ok(self.0)
        } else {
            Err(Error::InvalidInput(format!(
                "risk-free rate must be finite, got {}",
                self.0
            )))
        }
    }
}

/// History response envelope: `{ "body": [bar, ...] }`.
#[derive(Debug, Deserialize, Serialize)]
struct HistoryEnvelope {
    #[serde(default)]
    body: Vec<PriceBar>,
}

/// One treasury tenor; `rate` is in percent.
#[derive(Debug, Deserialize, Serialize)]
struct TreasuryRate {
    rate: f64,
}

/// Fundamentals file: the two raw provider modules side by side.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct FundamentalsEnvelope {
    statistics: StatisticsModule,
    financial_data: FinancialDataModule,
}

/// Reads provider responses saved as JSON files in one directory.
///
/// - `<TICKER>.json`: price history envelope
/// - `<TICKER>.stats.json`: `{ "statistics": {..}, "financialData": {..} }`
/// - `riskfree.json`: array of treasury tenors `[{ "rate": 4.5 }, ...]`
#[derive(Debug, Clone)]
pub struct JsonDirectoryProvider {
    root: PathBuf,
    tenor_index: usize,
}

impl JsonDirectoryProvider {
    /// Default treasury tenor position in `riskfree.json`.
    pub const DEFAULT_TENOR_INDEX: usize = 3;

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tenor_index: Self::DEFAULT_TENOR_INDEX,
        }
    }

    /// Use a different treasury tenor for the risk-free rate.
    pub fn with_tenor_index(mut self, index: usize) -> Self {
        self.tenor_index = index;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, file: &str) -> Result<String> {
        let path = self.root.join(file);
        if !path.exists() {
            return Err(Error::DataUnavailable(format!(
                "{} not found",
                path.display()
            )));
        }
        tracing::debug!("Reading {:?}", path);
        Ok(fs::read_to_string(path)?)
    }
}

impl PriceHistoryProvider for JsonDirectoryProvider {
    fn price_history(&self, ticker: &str) -> Result<PriceHistory> {
        let ticker = ticker.trim().to_uppercase();
        let envelope: HistoryEnvelope = serde_json::from_str(&self.read(&format!("{}.json", ticker))?)?;
        if envelope.body.is_empty() {
            return Err(Error::DataUnavailable(format!(
                "no price history for {}",
                ticker
            )));
        }
        Ok(PriceHistory::from_bars(&envelope.body))
    }
}

impl RiskFreeRateProvider for JsonDirectoryProvider {
    fn risk_free_rate(&self) -> Result<f64> {
        let rates: Vec<TreasuryRate> = serde_json::from_str(&self.read("riskfree.json")?)?;
        let tenor = rates.get(self.tenor_index).ok_or_else(|| {
            Error::DataUnavailable(format!(
                "treasury tenor {} missing ({} rates listed)",
                self.tenor_index,
                rates.len()
            ))
        })?;
        FixedRate(tenor.rate / 100.0).risk_free_rate()
    }
}

impl FundamentalsProvider for JsonDirectoryProvider {
    fn fundamentals(&self, ticker: &str) -> Result<Fundamentals> {
        let ticker = ticker.trim().to_uppercase();
        let envelope: FundamentalsEnvelope =
            serde_json::from_str(&self.read(&format!("{}.stats.json", ticker))?)?;
        Ok(Fundamentals::derive(
            &ticker,
            &envelope.statistics,
            &envelope.financial_data,
        ))
    }
}
