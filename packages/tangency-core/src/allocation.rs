//! Turning tangency weights into money.
//!
//! Dollar amounts per ticker for a given investment, and growth-of-$1 indices
//! for each asset and for the weighted portfolio.

use crate::types::PriceSeries;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dollar amount allocated to one ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DollarAllocation {
    pub ticker: String,
    pub weight: f64,
    /// Unrounded amount; round to cents only for display
    pub amount: f64,
}

impl fmt::Display for DollarAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ${:.2} ({:.2}%)",
            self.ticker,
            self.amount,
            self.weight * 100.0
        )
    }
}

/// Split `investment` across `tickers` in proportion to `weights`.
pub fn dollar_allocation(
    tickers: &[String],
    weights: &[f64],
    investment: f64,
) -> Result<Vec<DollarAllocation>> {
    if tickers.len() != weights.len() {
        return Err(Error::DimensionMismatch {
            left: (tickers.len(), 1),
            right: (weights.len(), 1),
        });
    }
    if !investment.is_finite() || investment <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "investment must be a positive amount, got {}",
            investment
        )));
    }

    Ok(tickers
        .iter()
        .zip(weights)
        .map(|(ticker, &weight)| DollarAllocation {
            ticker: ticker.clone(),
            weight,
            amount: weight * investment,
        })
        .collect())
}

/// Growth of $1 for one asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetGrowth {
    pub ticker: String,
    pub index: Vec<f64>,
}

/// Growth-of-$1 series for every asset and for the weighted portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthIndex {
    pub timestamps: Vec<DateTime<Utc>>,
    pub assets: Vec<AssetGrowth>,
    pub portfolio: Vec<f64>,
}

/// Index each series to its first close and combine them with `weights`.
///
/// Weights are renormalized to sum to one; all series must share a length.
pub fn indexed_growth(series: &[PriceSeries], weights: &[f64]) -> Result<GrowthIndex> {
    let first = series.first().ok_or_else(|| {
        Error::InsufficientData("Need at least one series for a growth index".to_string())
    })?;
    if series.len() != weights.len() {
        return Err(Error::DimensionMismatch {
            left: (series.len(), 1),
            right: (weights.len(), 1),
        });
    }
    if let Some(s) = series.iter().find(|s| s.len() != first.len()) {
        return Err(Error::MisalignedSeries {
            ticker: s.ticker().to_string(),
            expected: first.len(),
            found: s.len(),
        });
    }

    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 || weights.iter().any(|w| *w < 0.0) {
        return Err(Error::InvalidInput(format!(
            "weights must be non-negative with a positive sum, got {:?}",
            weights
        )));
    }

    let assets: Vec<AssetGrowth> = series
        .iter()
        .map(|s| {
            let base = s.close()[0];
            AssetGrowth {
                ticker: s.ticker().to_string(),
                index: s.close().iter().map(|c| c / base).collect(),
            }
        })
        .collect();

    let mut portfolio = vec![0.0; first.len()];
    for (asset, w) in assets.iter().zip(weights) {
        let w = w / total;
        for (p, v) in portfolio.iter_mut().zip(&asset.index) {
            *p += w * v;
        }
    }

    Ok(GrowthIndex {
        timestamps: first.timestamps().to_vec(),
        assets,
        portfolio,
    })
}
