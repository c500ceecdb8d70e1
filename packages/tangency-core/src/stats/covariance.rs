//! Annualized sample covariance across assets.

use super::TRADING_DAYS;
use crate::matrix::Matrix;
use crate::types::PriceSeries;
use crate::{Error, Result};
use serde::Serialize;

/// Symmetric, annualized covariance matrix of daily log returns.
///
/// Indexed in universe order. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovarianceMatrix {
    matrix: Matrix,
}

impl CovarianceMatrix {
    /// Estimate the covariance of the assets' daily log returns.
    ///
    /// Every series must have the same number of prices (same interval and
    /// window); the first series sets the expected length. At least three
    /// prices (two returns) are needed for the unbiased estimator.
    pub fn estimate(series: &[PriceSeries]) -> Result<Self> {
        let first = series.first().ok_or_else(|| {
            Error::InsufficientData("Need at least one asset for covariance".to_string())
        })?;

        let expected = first.len();
        if let Some(bad) = series.iter().find(|s| s.len() != expected) {
            return Err(Error::MisalignedSeries {
                ticker: bad.ticker().to_string(),
                expected,
                found: bad.len(),
            });
        }

        let returns: Vec<Vec<f64>> = series.iter().map(|s| s.log_returns()).collect();
        Self::from_returns(&returns)
    }

    /// Estimate from precomputed daily return vectors of equal length.
    pub fn from_returns(returns: &[Vec<f64>]) -> Result<Self> {
        let n = returns.len();
        if n == 0 {
            return Err(Error::InsufficientData(
                "Need at least one asset for covariance".to_string(),
            ));
        }

        let m = returns[0].len();
        if let Some(bad) = returns.iter().find(|r| r.len() != m) {
            return Err(Error::DimensionMismatch {
                left: (n, m),
                right: (1, bad.len()),
            });
        }
        if m < 2 {
            return Err(Error::InsufficientData(format!(
                "Need at least 2 returns per asset for covariance, got {}",
                m
            )));
        }

        let means: Vec<f64> = returns
            .iter()
            .map(|r| r.iter().sum::<f64>() / m as f64)
            .collect();

        let mut matrix = Matrix::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                let sum: f64 = returns[i]
                    .iter()
                    .zip(&returns[j])
                    .map(|(a, b)| (a - means[i]) * (b - means[j]))
                    .sum();
                let value = sum / (m - 1) as f64 * TRADING_DAYS;
                matrix.set(i, j, value);
                matrix.set(j, i, value);
            }
        }

        Ok(Self { matrix })
    }

    /// Use an explicit annualized covariance matrix.
    ///
    /// The rows must form a square, symmetric matrix with a non-negative diagonal.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let matrix = Matrix::from_rows(rows)?;
        let n = matrix.rows();
        if n == 0 || matrix.cols() != n {
            return Err(Error::DimensionMismatch {
                left: matrix.shape(),
                right: (matrix.cols(), matrix.rows()),
            });
        }

        for i in 0..n {
            let d = matrix.get(i, i);
            if !d.is_finite() || d < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "covariance diagonal entry {} must be non-negative, got {}",
                    i, d
                )));
            }
            for j in i + 1..n {
                let (a, b) = (matrix.get(i, j), matrix.get(j, i));
                if (a - b).abs() > 1e-12 * a.abs().max(b.abs()).max(1.0) {
                    return Err(Error::InvalidInput(format!(
                        "covariance must be symmetric: [{}][{}]={} but [{}][{}]={}",
                        i, j, a, j, i, b
                    )));
                }
            }
        }

        Ok(Self { matrix })
    }

    /// Number of assets.
    pub fn size(&self) -> usize {
        self.matrix.rows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix.get(i, j)
    }

    /// Annualized variance of asset `i`.
    pub fn variance(&self, i: usize) -> f64 {
        self.matrix.get(i, i)
    }

    /// Correlation between assets `i` and `j`, `None` when either has zero variance.
    pub fn correlation(&self, i: usize, j: usize) -> Option<f64> {
        let denom = (self.variance(i) * self.variance(j)).sqrt();
        if denom > 0.0 {
            Some(self.get(i, j) / denom)
        } else {
            None
        }
    }

    pub fn as_matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Nested rows, e.g. for display.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.matrix.to_rows()
    }
}
