//! Maximum-Sharpe (tangency) portfolio search.
//!
//! Two phases over the long-only, fully-invested simplex:
//!
//! 1. **Sampling**: draw random weight vectors, evaluate each and keep them all.
//! 2. **Refinement**: gradient ascent on the Sharpe ratio from the best sample,
//!    projected back onto the simplex by clipping and renormalizing.
//!
//! Sample evaluation is a pure function of the weights, so the sampling loop can
//! be split across threads without changing its callers.

mod gradient;
mod sampler;

pub use gradient::{project_step, sharpe_gradient};
pub use sampler::draw_weights;

use crate::config::OptimizerConfig;
use crate::matrix::dot;
use crate::stats::CovarianceMatrix;
use crate::types::{OptimizationResult, PortfolioSample};
use crate::{Error, Result};
use rand::Rng;

/// Portfolio variance at or below this is treated as zero.
const MIN_VARIANCE: f64 = 1e-18;

/// Sharpe-ratio optimizer over a fixed asset universe.
#[derive(Debug, Clone)]
pub struct PortfolioOptimizer {
    tickers: Vec<String>,
    means: Vec<f64>,
    covariance: CovarianceMatrix,
    risk_free_rate: f64,
    config: OptimizerConfig,
}

impl PortfolioOptimizer {
    /// Create an optimizer.
    ///
    /// # Arguments
    ///
    /// * `tickers` - Asset names, defining the index order
    /// * `means` - Annualized expected returns, one per ticker
    /// * `covariance` - Annualized covariance, sized to the tickers
    /// * `risk_free_rate` - Annual risk-free rate in decimal form
    /// * `config` - Sampling and refinement settings
    pub fn new(
        tickers: Vec<String>,
        means: Vec<f64>,
        covariance: CovarianceMatrix,
        risk_free_rate: f64,
        config: OptimizerConfig,
    ) -> Result<Self> {
        if tickers.is_empty() {
            return Err(Error::InsufficientData(
                "Need at least one asset to optimize".to_string(),
            ));
        }
        if means.len() != tickers.len() || covariance.size() != tickers.len() {
            return Err(Error::DimensionMismatch {
                left: (tickers.len(), means.len()),
                right: (covariance.size(), covariance.size()),
            });
        }
        if let Some(m) = means.iter().find(|m| !m.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "expected returns must be finite, got {}",
                m
            )));
        }
        config.validate()?;

        Ok(Self {
            tickers,
            means,
            covariance,
            risk_free_rate,
            config,
        })
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Expected return, volatility and Sharpe ratio of a weight vector.
    ///
    /// Fails with `ZeroVolatility` when the portfolio variance vanishes.
    pub fn evaluate(&self, weights: &[f64]) -> Result<PortfolioSample> {
        let expected_return = dot(weights, &self.means)?;
        let variance = self.covariance.as_matrix().quadratic_form(weights)?;

        if variance.is_nan() || variance <= MIN_VARIANCE {
            return Err(Error::ZeroVolatility(format!(
                "portfolio variance {} for weights {:?}",
                variance, weights
            )));
        }

        let volatility = variance.sqrt();
        Ok(PortfolioSample {
            weights: weights.to_vec(),
            expected_return,
            volatility,
            sharpe: (expected_return - self.risk_free_rate) / volatility,
        })
    }

    /// Phase 1: evaluate `num_simulations` random portfolios.
    ///
    /// Returns every sample in generation order together with the index of the
    /// best Sharpe ratio. Any degenerate sample aborts the phase.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Vec<PortfolioSample>, usize)> {
        let count = self.config.num_simulations;
        let mut samples: Vec<PortfolioSample> = Vec::with_capacity(count);
        let mut best = 0;

        for i in 0..count {
            let weights = draw_weights(rng, self.len(), self.config.weight_scheme);
            let sample = self.evaluate(&weights)?;
            if i == 0 || sample.sharpe > samples[best].sharpe {
                best = i;
            }
            samples.push(sample);
        }

        Ok((samples, best))
    }

    /// Phase 2: gradient ascent on the Sharpe ratio starting from `start`.
    ///
    /// A step that would lower the Sharpe ratio is halved up to
    /// `max_backtracks` times; when none of the halvings helps the search has
    /// converged and stops early. The result therefore never has a lower
    /// Sharpe ratio than `start`.
    pub fn refine(&self, start: PortfolioSample) -> Result<PortfolioSample> {
        if self.len() == 1 {
            return Ok(start);
        }

        let steps = self.config.refinement_steps();
        let mut current = start;

        for step in 0..steps {
            let cov_w = self.covariance.as_matrix().mul_vec(&current.weights)?;
            let variance = dot(&current.weights, &cov_w)?;
            if variance.is_nan() || variance <= MIN_VARIANCE {
                tracing::debug!(step, "Refinement stopped at zero portfolio variance");
                break;
            }

            let grad = sharpe_gradient(&self.means, &cov_w, variance, current.sharpe);

            let mut alpha = self.config.step_size;
            let mut accepted = None;
            for _ in 0..=self.config.max_backtracks {
                if let Some(weights) = project_step(&current.weights, &grad, alpha) {
                    match self.evaluate(&weights) {
                        Ok(candidate) if candidate.sharpe >= current.sharpe => {
                            accepted = Some(candidate);
                            break;
                        }
                        Ok(_) | Err(Error::ZeroVolatility(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
                alpha *= 0.5;
            }

            match accepted {
                Some(next) => current = next,
                None => {
                    tracing::debug!(step, sharpe = current.sharpe, "Refinement converged");
                    break;
                }
            }
        }

        Ok(current)
    }

    /// Run both phases.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<OptimizationResult> {
        let (samples, best) = self.sample(rng)?;
        tracing::debug!(
            samples = samples.len(),
            best_sharpe = samples[best].sharpe,
            "Sampling phase complete"
        );

        let refined = self.refine(samples[best].clone())?;
        tracing::debug!(
            sharpe = refined.sharpe,
            improvement = refined.sharpe - samples[best].sharpe,
            "Refinement phase complete"
        );

        Ok(OptimizationResult {
            tickers: self.tickers.clone(),
            weights: refined.weights,
            expected_return: refined.expected_return,
            volatility: refined.volatility,
            sharpe: refined.sharpe,
            risk_free_rate: self.risk_free_rate,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeightScheme;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tickers(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("T{}", i)).collect()
    }

    fn config(simulations: usize, steps: usize) -> OptimizerConfig {
        OptimizerConfig {
            num_simulations: simulations,
            refinement_steps: Some(steps),
            ..Default::default()
        }
    }

    fn three_asset_optimizer(cfg: OptimizerConfig) -> PortfolioOptimizer {
        let cov = CovarianceMatrix::from_rows(&[
            vec![0.04, 0.006, 0.01],
            vec![0.006, 0.02, 0.004],
            vec![0.01, 0.004, 0.09],
        ])
        .unwrap();
        PortfolioOptimizer::new(tickers(3), vec![0.12, 0.08, 0.15], cov, 0.02, cfg).unwrap()
    }

    fn assert_on_simplex(w: &[f64]) {
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "weights sum to {}", sum);
        assert!(w.iter().all(|&x| x >= 0.0), "negative weight in {:?}", w);
    }

    #[test]
    fn test_samples_on_simplex() {
        let opt = three_asset_optimizer(config(1000, 100));
        let mut rng = StdRng::seed_from_u64(1);
        let result = opt.run(&mut rng).unwrap();

        assert_eq!(result.samples.len(), 1000);
        for s in &result.samples {
            assert_on_simplex(&s.weights);
            assert!(s.volatility > 0.0);
        }
        assert_on_simplex(&result.weights);
    }

    #[test]
    fn test_sample_reports_best_index() {
        let opt = three_asset_optimizer(config(300, 10));
        let mut rng = StdRng::seed_from_u64(9);
        let (samples, best) = opt.sample(&mut rng).unwrap();

        assert_eq!(samples.len(), 300);
        let max = samples
            .iter()
            .map(|s| s.sharpe)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(samples[best].sharpe, max);
        // First occurrence wins ties
        assert!(samples[..best].iter().all(|s| s.sharpe < max));
    }

    #[test]
    fn test_refinement_never_worse_than_best_sample() {
        for seed in 0..5 {
            let opt = three_asset_optimizer(config(200, 500));
            let mut rng = StdRng::seed_from_u64(seed);
            let result = opt.run(&mut rng).unwrap();
            let best = result.best_sampled_sharpe().unwrap();
            assert!(
                result.sharpe >= best,
                "seed {}: refined {} < sampled {}",
                seed,
                result.sharpe,
                best
            );
        }
    }

    #[test]
    fn test_refinement_reaches_analytic_tangency() {
        // Unconstrained tangency weights are proportional to Σ⁻¹(μ − r_f); for
        // this input they are all positive, so the long-only optimum matches.
        let cov = CovarianceMatrix::from_rows(&[vec![0.04, 0.0], vec![0.0, 0.09]]).unwrap();
        let opt =
            PortfolioOptimizer::new(tickers(2), vec![0.10, 0.12], cov, 0.02, config(300, 5000))
                .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let result = opt.run(&mut rng).unwrap();

        // Σ⁻¹(μ − r_f) = [0.08/0.04, 0.10/0.09] = [2.0, 1.111..]
        let raw = [2.0, 0.10 / 0.09];
        let total: f64 = raw.iter().sum();
        assert!((result.weights[0] - raw[0] / total).abs() < 1e-3);
        assert!((result.weights[1] - raw[1] / total).abs() < 1e-3);
    }

    #[test]
    fn test_anti_correlated_pair_goes_half_half() {
        let cov = CovarianceMatrix::from_rows(&[vec![0.04, -0.04], vec![-0.04, 0.04]]).unwrap();
        let opt =
            PortfolioOptimizer::new(tickers(2), vec![0.10, 0.10], cov, 0.01, config(2000, 2000))
                .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let result = opt.run(&mut rng).unwrap();

        assert!((result.weights[0] - 0.5).abs() < 0.01, "{:?}", result.weights);
        assert!((result.weights[1] - 0.5).abs() < 0.01, "{:?}", result.weights);
        assert!(result.volatility < 0.01);
        assert!(result.sharpe >= result.best_sampled_sharpe().unwrap());
    }

    #[test]
    fn test_single_asset() {
        let cov = CovarianceMatrix::from_rows(&[vec![0.0625]]).unwrap();
        let opt = PortfolioOptimizer::new(tickers(1), vec![0.11], cov, 0.01, config(50, 50))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let result = opt.run(&mut rng).unwrap();

        assert_eq!(result.weights, vec![1.0]);
        assert_relative_eq!(result.volatility, 0.25);
        assert_relative_eq!(result.sharpe, (0.11 - 0.01) / 0.25);
        assert!(result.samples.iter().all(|s| s.weights == vec![1.0]));
    }

    #[test]
    fn test_seed_reproducibility() {
        let opt = three_asset_optimizer(config(300, 300));
        let a = opt.run(&mut StdRng::seed_from_u64(21)).unwrap();
        let b = opt.run(&mut StdRng::seed_from_u64(21)).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.samples, b.samples);
    }

    #[test]
    fn test_dirichlet_scheme() {
        let cfg = OptimizerConfig {
            weight_scheme: WeightScheme::Dirichlet,
            ..config(500, 200)
        };
        let opt = three_asset_optimizer(cfg);
        let result = opt.run(&mut StdRng::seed_from_u64(4)).unwrap();
        for s in &result.samples {
            assert_on_simplex(&s.weights);
        }
        assert!(result.sharpe >= result.best_sampled_sharpe().unwrap());
    }

    #[test]
    fn test_zero_volatility_sample_aborts() {
        let cov = CovarianceMatrix::from_rows(&[vec![0.0, 0.0], vec![0.0, 0.0]]).unwrap();
        let opt = PortfolioOptimizer::new(tickers(2), vec![0.1, 0.1], cov, 0.01, config(10, 10))
            .unwrap();
        let result = opt.run(&mut StdRng::seed_from_u64(1));
        assert!(matches!(result, Err(Error::ZeroVolatility(_))));
    }

    #[test]
    fn test_dimension_checks() {
        let cov = CovarianceMatrix::from_rows(&[vec![0.04]]).unwrap();
        let result =
            PortfolioOptimizer::new(tickers(2), vec![0.1, 0.1], cov, 0.01, config(10, 10));
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));

        let cov = CovarianceMatrix::from_rows(&[vec![0.04]]).unwrap();
        let result = PortfolioOptimizer::new(vec![], vec![], cov, 0.01, config(10, 10));
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_evaluate() {
        let opt = three_asset_optimizer(config(10, 10));
        let s = opt.evaluate(&[1.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(s.expected_return, 0.12, epsilon = 1e-12);
        assert_relative_eq!(s.volatility, 0.2, epsilon = 1e-12);
        assert_relative_eq!(s.sharpe, 0.5, epsilon = 1e-12);
    }
}
