//! Sharpe-ratio gradient and the clip-then-renormalize projection.

/// Gradient of the Sharpe ratio with respect to the weights.
///
/// `grad_i = (μ_i·σ_p − S·(Σw)_i) / (wᵀΣw)`
///
/// # Arguments
///
/// * `means` - Annualized expected returns `μ`
/// * `cov_w` - The covariance-weight product `Σw`
/// * `variance` - Portfolio variance `wᵀΣw`, must be positive
/// * `sharpe` - Current Sharpe ratio `S`
pub fn sharpe_gradient(means: &[f64], cov_w: &[f64], variance: f64, sharpe: f64) -> Vec<f64> {
    let vol = variance.sqrt();
    means
        .iter()
        .zip(cov_w)
        .map(|(mu, cw)| (mu * vol - sharpe * cw) / variance)
        .collect()
}

/// Take an ascent step, clip negatives to zero and renormalize.
///
/// This is a projected-gradient heuristic rather than an exact Euclidean
/// projection onto the simplex. Returns `None` when every weight clips to zero.
pub fn project_step(weights: &[f64], gradient: &[f64], step: f64) -> Option<Vec<f64>> {
    let stepped: Vec<f64> = weights
        .iter()
        .zip(gradient)
        .map(|(w, g)| (w + step * g).max(0.0))
        .collect();

    let sum: f64 = stepped.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        Some(stepped.into_iter().map(|w| w / sum).collect())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{dot, Matrix};

    fn sharpe(w: &[f64], means: &[f64], cov: &Matrix, rf: f64) -> f64 {
        (dot(w, means).unwrap() - rf) / cov.quadratic_form(w).unwrap().sqrt()
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let means = [0.12, 0.08, 0.15];
        let cov = Matrix::from_rows(&[
            vec![0.04, 0.006, 0.01],
            vec![0.006, 0.02, 0.004],
            vec![0.01, 0.004, 0.09],
        ])
        .unwrap();
        let rf = 0.02;
        let w = [0.3, 0.5, 0.2];

        let cov_w = cov.mul_vec(&w).unwrap();
        let variance = dot(&w, &cov_w).unwrap();
        let s = sharpe(&w, &means, &cov, rf);
        let grad = sharpe_gradient(&means, &cov_w, variance, s);

        let h = 1e-6;
        for i in 0..3 {
            let mut up = w;
            let mut down = w;
            up[i] += h;
            down[i] -= h;
            let numeric = (sharpe(&up, &means, &cov, rf) - sharpe(&down, &means, &cov, rf)) / (2.0 * h);
            assert!(
                (numeric - grad[i]).abs() < 1e-5,
                "component {}: analytic {} numeric {}",
                i,
                grad[i],
                numeric
            );
        }
    }

    #[test]
    fn test_project_step_clips_and_renormalizes() {
        let w = project_step(&[0.5, 0.5], &[10.0, -100.0], 0.01).unwrap();
        // 0.5 + 0.1 = 0.6, 0.5 - 1.0 clipped to 0
        assert_eq!(w, vec![1.0, 0.0]);
    }

    #[test]
    fn test_project_step_all_clipped() {
        assert!(project_step(&[0.5, 0.5], &[-100.0, -100.0], 0.01).is_none());
    }

    #[test]
    fn test_project_step_zero_gradient_is_identity() {
        let w = project_step(&[0.2, 0.3, 0.5], &[0.0, 0.0, 0.0], 0.01).unwrap();
        assert!((w[0] - 0.2).abs() < 1e-15);
        assert!((w[1] - 0.3).abs() < 1e-15);
        assert!((w[2] - 0.5).abs() < 1e-15);
    }
}
