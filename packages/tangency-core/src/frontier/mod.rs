//! Efficient frontier and capital allocation line.
//!
//! Post-processes the optimizer's sample cloud:
//!
//! - **Tangency**: the maximum-Sharpe portfolio; its Sharpe ratio is the CAL slope
//! - **Upper frontier**: staircase envelope of the cloud
//! - **Bucket envelope**: outline of the cloud by return bucket
//! - **Smoothing**: polynomial fit of volatility against return, for display only

mod envelope;
mod polyfit;

pub use envelope::{upper_envelope, BucketEnvelope};
pub use polyfit::PolynomialFit;

use crate::types::{OptimizationResult, PortfolioSample};
use crate::{Error, Result};
use serde::Serialize;

/// A sequence of `(volatility, return)` points.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Curve {
    pub volatilities: Vec<f64>,
    pub returns: Vec<f64>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.volatilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volatilities.is_empty()
    }

    /// Iterate over `(volatility, return)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.volatilities
            .iter()
            .copied()
            .zip(self.returns.iter().copied())
    }
}

/// Most points a display grid may hold.
pub const MAX_GRID_POINTS: usize = 100_000;

/// Evenly spaced values from `start` to `end` inclusive.
///
/// An empty or reversed range, or a non-positive step, gives no points. A
/// step too small for the range to fit in [`MAX_GRID_POINTS`] is an error.
pub fn grid(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if step.is_nan() || step <= 0.0 || !start.is_finite() || !end.is_finite() || end < start {
        return Ok(Vec::new());
    }
    let intervals = ((end - start) / step + 1e-9).floor();
    if !intervals.is_finite() || intervals >= MAX_GRID_POINTS as f64 {
        return Err(Error::InvalidInput(format!(
            "step {} over [{}, {}] exceeds {} points",
            step, start, end, MAX_GRID_POINTS
        )));
    }
    let count = intervals as usize + 1;
    Ok((0..count).map(|i| start + step * i as f64).collect())
}

/// Frontier envelope, tangency portfolio and capital allocation line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontier {
    /// Upper-frontier volatilities, ascending
    pub volatilities: Vec<f64>,
    /// Upper-frontier returns, matching `volatilities`
    pub returns: Vec<f64>,
    /// Capital allocation line slope (the tangency Sharpe ratio)
    pub cal_slope: f64,
    /// Maximum-Sharpe portfolio
    pub tangency: PortfolioSample,
    /// Risk-free rate, the CAL intercept
    pub risk_free_rate: f64,
}

impl Frontier {
    /// Extract the frontier from a sample cloud.
    ///
    /// Sharpe ratios are recomputed against `risk_free_rate`.
    pub fn from_samples(samples: &[PortfolioSample], risk_free_rate: f64) -> Result<Self> {
        let tangency = tangency(samples, risk_free_rate).ok_or_else(|| {
            Error::InsufficientData("Need at least one portfolio sample".to_string())
        })?;
        let upper = upper_envelope(samples);

        Ok(Self {
            volatilities: upper.volatilities,
            returns: upper.returns,
            cal_slope: tangency.sharpe,
            tangency,
            risk_free_rate,
        })
    }

    /// Extract the frontier from an optimization run.
    ///
    /// The refined portfolio competes with the samples for the tangency point;
    /// the envelope itself only uses the samples.
    pub fn from_result(result: &OptimizationResult) -> Result<Self> {
        let mut frontier = Self::from_samples(&result.samples, result.risk_free_rate)?;

        let refined = result.refined();
        if result.volatility > 0.0 && refined.sharpe > frontier.cal_slope {
            frontier.cal_slope = refined.sharpe;
            frontier.tangency = refined;
        }
        Ok(frontier)
    }

    /// Upper frontier as a curve.
    pub fn curve(&self) -> Curve {
        Curve {
            volatilities: self.volatilities.clone(),
            returns: self.returns.clone(),
        }
    }

    /// Capital allocation line: `r_f + slope · σ`.
    pub fn cal(&self, volatility: f64) -> f64 {
        self.risk_free_rate + self.cal_slope * volatility
    }

    /// The CAL sampled over `σ ∈ [0, max_volatility]`.
    pub fn cal_line(&self, max_volatility: f64, step: f64) -> Result<Curve> {
        let volatilities = grid(0.0, max_volatility, step)?;
        let returns = volatilities.iter().map(|&v| self.cal(v)).collect();
        Ok(Curve {
            volatilities,
            returns,
        })
    }

    /// Least-squares fit of frontier volatility as a polynomial in return.
    pub fn fit(&self, degree: usize) -> Result<PolynomialFit> {
        PolynomialFit::fit(&self.returns, &self.volatilities, degree)
    }

    /// Smooth display curve: the fitted volatility across the frontier's return
    /// range, spaced by `step`. Does not affect the tangency weights.
    pub fn smoothed_curve(&self, degree: usize, step: f64) -> Result<Curve> {
        let fit = self.fit(degree)?;
        let lo = self.returns.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self.returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let returns = grid(lo, hi, step)?;
        let volatilities = returns.iter().map(|&r| fit.evaluate(r)).collect();
        Ok(Curve {
            volatilities,
            returns,
        })
    }
}

/// Maximum-Sharpe sample, with its Sharpe ratio recomputed against `risk_free_rate`.
pub fn tangency(samples: &[PortfolioSample], risk_free_rate: f64) -> Option<PortfolioSample> {
    samples
        .iter()
        .filter(|s| s.volatility > 0.0)
        .map(|s| PortfolioSample {
            sharpe: (s.expected_return - risk_free_rate) / s.volatility,
            ..s.clone()
        })
        .fold(None, |best: Option<PortfolioSample>, s| match best {
            Some(b) if b.sharpe >= s.sharpe => Some(b),
            _ => Some(s),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(expected_return: f64, volatility: f64, rf: f64) -> PortfolioSample {
        PortfolioSample {
            weights: vec![0.5, 0.5],
            expected_return,
            volatility,
            sharpe: (expected_return - rf) / volatility,
        }
    }

    fn cloud(rf: f64) -> Vec<PortfolioSample> {
        // Points on σ² = 0.02 + 2(μ − 0.1)² plus interior noise
        let mut samples = Vec::new();
        for i in 0..60 {
            let mu = 0.04 + 0.004 * i as f64;
            let sigma = (0.02 + 2.0 * (mu - 0.1_f64).powi(2)).sqrt();
            samples.push(sample(mu, sigma, rf));
            samples.push(sample(mu - 0.01, sigma + 0.02, rf));
        }
        samples
    }

    #[test]
    fn test_tangency_is_max_sharpe() {
        let rf = 0.01;
        let samples = cloud(rf);
        let frontier = Frontier::from_samples(&samples, rf).unwrap();

        let best = samples
            .iter()
            .map(|s| s.sharpe)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(frontier.cal_slope, best);
        assert_eq!(frontier.cal_slope, frontier.tangency.sharpe);
    }

    #[test]
    fn test_tangency_recomputes_sharpe() {
        let samples = vec![sample(0.10, 0.20, 0.0), sample(0.08, 0.10, 0.0)];
        let t = tangency(&samples, 0.05).unwrap();
        // (0.10 - 0.05)/0.2 = 0.25 vs (0.08 - 0.05)/0.1 = 0.3
        assert_relative_eq!(t.sharpe, 0.3, epsilon = 1e-12);
        assert_eq!(t.expected_return, 0.08);
    }

    #[test]
    fn test_frontier_monotonic() {
        let frontier = Frontier::from_samples(&cloud(0.01), 0.01).unwrap();
        assert!(frontier.volatilities.len() > 1);
        for w in frontier.volatilities.windows(2) {
            assert!(w[0] <= w[1]);
        }
        for w in frontier.returns.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn test_empty_samples() {
        assert!(matches!(
            Frontier::from_samples(&[], 0.01),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_cal_line() {
        let frontier = Frontier::from_samples(&[sample(0.11, 0.2, 0.01)], 0.01).unwrap();
        assert_relative_eq!(frontier.cal_slope, 0.5, epsilon = 1e-12);
        assert_relative_eq!(frontier.cal(0.0), 0.01);
        assert_relative_eq!(frontier.cal(0.2), 0.11, epsilon = 1e-12);

        let line = frontier.cal_line(1.5, 0.01).unwrap();
        assert_eq!(line.len(), 151);
        assert_eq!(line.volatilities[0], 0.0);
        assert_relative_eq!(*line.volatilities.last().unwrap(), 1.5, epsilon = 1e-9);
        for (v, r) in line.points() {
            assert_relative_eq!(r, 0.01 + 0.5 * v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_smoothed_curve_tracks_frontier() {
        let frontier = Frontier::from_samples(&cloud(0.01), 0.01).unwrap();
        let curve = frontier.smoothed_curve(2, 0.002).unwrap();
        assert!(!curve.is_empty());

        let fit = frontier.fit(2).unwrap();
        for (v, r) in frontier.curve().points() {
            assert!((fit.evaluate(r) - v).abs() < 0.02);
        }
    }

    #[test]
    fn test_from_result_prefers_refined_point() {
        let rf = 0.01;
        let samples = cloud(rf);
        let result = OptimizationResult {
            tickers: vec!["A".to_string(), "B".to_string()],
            weights: vec![0.4, 0.6],
            expected_return: 0.2,
            volatility: 0.1,
            sharpe: (0.2 - rf) / 0.1,
            risk_free_rate: rf,
            samples,
        };
        let frontier = Frontier::from_result(&result).unwrap();
        assert_relative_eq!(frontier.cal_slope, 1.9, epsilon = 1e-12);
        assert_eq!(frontier.tangency.weights, vec![0.4, 0.6]);
    }

    #[test]
    fn test_grid() {
        assert_eq!(grid(0.0, 1.0, 0.25).unwrap(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(grid(0.0, 0.0, 0.1).unwrap(), vec![0.0]);
        assert!(grid(1.0, 0.0, 0.1).unwrap().is_empty());
        assert!(grid(0.0, 1.0, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_grid_rejects_tiny_step() {
        assert!(matches!(grid(0.0, 1.5, 1e-20), Err(Error::InvalidInput(_))));
        assert!(matches!(
            grid(0.0, 1.0, 1.0 / MAX_GRID_POINTS as f64),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(grid(0.0, 1.0, 1e-4).unwrap().len(), 10_001);

        let frontier = Frontier::from_samples(&[sample(0.11, 0.2, 0.01)], 0.01).unwrap();
        assert!(matches!(
            frontier.cal_line(1.5, 1e-20),
            Err(Error::InvalidInput(_))
        ));
    }
}
