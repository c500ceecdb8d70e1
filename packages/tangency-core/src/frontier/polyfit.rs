//! Least-squares polynomial fit via the normal equations.

use crate::matrix::{solve, Matrix};
use crate::{Error, Result};
use serde::Serialize;

/// Polynomial `y = Σ a_k · t^k` in the scaled variable
/// `t = (x - center) / half_range`, which maps the fitted `x` range onto
/// `[-1, 1]`. Coefficients are in ascending powers of `t`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolynomialFit {
    pub coefficients: Vec<f64>,
    pub center: f64,
    pub half_range: f64,
}

impl PolynomialFit {
    /// Ordinary least-squares fit of the given degree.
    ///
    /// Builds the `(degree+1) x (degree+1)` system `AᵀA · a = Aᵀy` from the
    /// Vandermonde powers of the scaled `x` and solves it with Gaussian
    /// elimination. Every power of `t` stays within `[-1, 1]`. Repeated or
    /// too few distinct `x` values make the system singular.
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::DimensionMismatch {
                left: (x.len(), 1),
                right: (y.len(), 1),
            });
        }
        if x.is_empty() {
            return Err(Error::InsufficientData(
                "Need at least one point for a polynomial fit".to_string(),
            ));
        }

        let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let center = (lo + hi) / 2.0;
        let half_range = match (hi - lo) / 2.0 {
            h if h.is_finite() && h > 0.0 => h,
            _ => 1.0,
        };

        let size = degree + 1;
        // Σ t^p for p in 0..=2·degree
        let mut power_sums = vec![0.0; 2 * degree + 1];
        let mut rhs = vec![0.0; size];
        for (&xk, &yk) in x.iter().zip(y) {
            let t = (xk - center) / half_range;
            let mut p = 1.0;
            for (i, sum) in power_sums.iter_mut().enumerate() {
                *sum += p;
                if i < size {
                    rhs[i] += yk * p;
                }
                p *= t;
            }
        }

        let mut normal = Matrix::zeros(size, size);
        for i in 0..size {
            for j in 0..size {
                normal.set(i, j, power_sums[i + j]);
            }
        }

        let coefficients = solve(normal, rhs)?;
        Ok(Self {
            coefficients,
            center,
            half_range,
        })
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluate at `x` (Horner's rule in the scaled variable).
    pub fn evaluate(&self, x: f64) -> f64 {
        let t = (x - self.center) / self.half_range;
        self.coefficients.iter().rev().fold(0.0, |acc, a| acc * t + a)
    }
}
