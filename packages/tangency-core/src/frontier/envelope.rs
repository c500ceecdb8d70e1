//! Envelopes of the sampled risk/return cloud.
//!
//! Both are heuristics over a discrete cloud, not a quadratic-programming
//! frontier.

use super::Curve;
use crate::types::PortfolioSample;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Upper (efficient) frontier as a staircase.
///
/// Samples are scanned in ascending volatility; a sample is kept only when its
/// expected return strictly beats every lower-volatility sample kept so far.
/// The result has ascending volatility and strictly increasing return.
pub fn upper_envelope(samples: &[PortfolioSample]) -> Curve {
    let mut sorted: Vec<&PortfolioSample> = samples.iter().collect();
    sorted.sort_by(|a, b| {
        a.volatility
            .partial_cmp(&b.volatility)
            .unwrap_or(Ordering::Equal)
    });

    let mut curve = Curve::default();
    let mut max_return = f64::NEG_INFINITY;
    for s in sorted {
        if s.expected_return > max_return {
            curve.volatilities.push(s.volatility);
            curve.returns.push(s.expected_return);
            max_return = s.expected_return;
        }
    }
    curve
}

/// Outline of the cloud built from return buckets.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct BucketEnvelope {
    /// Max-volatility edge, ascending return, followed by the min-volatility
    /// edge in descending return
    pub outline: Curve,
}

impl BucketEnvelope {
    /// Bucket samples by expected return rounded to a multiple of `step` and
    /// keep the lowest- and highest-volatility sample of each bucket.
    ///
    /// `step` must be positive; non-finite samples are skipped.
    pub fn from_samples(samples: &[PortfolioSample], step: f64) -> Self {
        let mut buckets: BTreeMap<i64, (&PortfolioSample, &PortfolioSample)> = BTreeMap::new();

        for s in samples {
            let key = (s.expected_return / step).round();
            if !key.is_finite() || !s.volatility.is_finite() {
                continue;
            }
            buckets
                .entry(key as i64)
                .and_modify(|(min, max)| {
                    if s.volatility < min.volatility {
                        *min = s;
                    }
                    if s.volatility > max.volatility {
                        *max = s;
                    }
                })
                .or_insert((s, s));
        }

        let mut outline = Curve::default();
        for (_, max) in buckets.values() {
            outline.volatilities.push(max.volatility);
            outline.returns.push(max.expected_return);
        }
        for (min, _) in buckets.values().rev() {
            outline.volatilities.push(min.volatility);
            outline.returns.push(min.expected_return);
        }

        Self { outline }
    }

    /// Number of return buckets.
    pub fn bucket_count(&self) -> usize {
        self.outline.len() / 2
    }
}
