//! Random weight vectors on the long-only simplex.

use crate::config::WeightScheme;
use rand::Rng;
use rand_distr::{Distribution, Exp1};

/// Draw `n` non-negative weights summing to one.
///
/// `Normalized` divides independent `U(0,1)` draws by their sum, which
/// over-weights the centre of the simplex. `Dirichlet` normalizes `Exp(1)`
/// draws instead, giving a uniform draw over the simplex.
pub fn draw_weights<R: Rng + ?Sized>(rng: &mut R, n: usize, scheme: WeightScheme) -> Vec<f64> {
    loop {
        let raw: Vec<f64> = match scheme {
            WeightScheme::Normalized => (0..n).map(|_| rng.gen::<f64>()).collect(),
            WeightScheme::Dirichlet => (0..n).map(|_| Exp1.sample(rng)).collect(),
        };

        let sum: f64 = raw.iter().sum();
        // All-zero draws are possible in principle; redraw
        if sum > 0.0 && sum.is_finite() {
            return raw.into_iter().map(|w| w / sum).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_on_simplex(w: &[f64]) {
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12, "weights sum to {}", sum);
        assert!(w.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn test_normalized_weights_on_simplex() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in 1..8 {
            for _ in 0..200 {
                let w = draw_weights(&mut rng, n, WeightScheme::Normalized);
                assert_eq!(w.len(), n);
                assert_on_simplex(&w);
            }
        }
    }

    #[test]
    fn test_dirichlet_weights_on_simplex() {
        let mut rng = StdRng::seed_from_u64(12);
        for n in 1..8 {
            for _ in 0..200 {
                let w = draw_weights(&mut rng, n, WeightScheme::Dirichlet);
                assert_eq!(w.len(), n);
                assert_on_simplex(&w);
            }
        }
    }

    #[test]
    fn test_single_asset_is_fully_invested() {
        let mut rng = StdRng::seed_from_u64(13);
        assert_eq!(draw_weights(&mut rng, 1, WeightScheme::Normalized), vec![1.0]);
    }

    #[test]
    fn test_normalized_draw_concentrates_near_centre() {
        // With three assets the normalized draw puts fewer samples near the
        // vertices than a uniform simplex draw does.
        let corner = |scheme| {
            let mut rng = StdRng::seed_from_u64(99);
            (0..5000)
                .filter(|_| draw_weights(&mut rng, 3, scheme).iter().any(|&w| w > 0.8))
                .count()
        };
        assert!(corner(WeightScheme::Normalized) < corner(WeightScheme::Dirichlet));
    }
}
