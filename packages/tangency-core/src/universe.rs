//! Asset universe assembly.
//!
//! Turns per-ticker provider results into an aligned set of price series. A
//! ticker whose history is missing or invalid is either dropped or fails the
//! whole run, depending on the policy; histories of different lengths are
//! always an error.

use crate::providers::PriceHistoryProvider;
use crate::types::{PriceHistory, PriceSeries};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// What to do with a ticker whose price history is missing or invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IncompletePolicy {
    /// Drop the ticker from the universe and continue
    #[default]
    Exclude,
    /// Fail the run
    Reject,
}

/// Fixed, ordered set of aligned price series.
#[derive(Debug, Clone)]
pub struct Universe {
    series: Vec<PriceSeries>,
}

impl Universe {
    /// Create a universe from validated series.
    ///
    /// Requires at least one series, unique tickers, equal lengths and
    /// identical timestamps across all series.
    pub fn new(series: Vec<PriceSeries>) -> Result<Self> {
        let first = series.first().ok_or_else(|| {
            Error::InsufficientData("Universe needs at least one asset".to_string())
        })?;

        for (i, s) in series.iter().enumerate() {
            if series[..i].iter().any(|o| o.ticker() == s.ticker()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate ticker {}",
                    s.ticker()
                )));
            }
            if s.len() != first.len() {
                return Err(Error::MisalignedSeries {
                    ticker: s.ticker().to_string(),
                    expected: first.len(),
                    found: s.len(),
                });
            }
            if let Some(idx) = s
                .timestamps()
                .iter()
                .zip(first.timestamps())
                .position(|(a, b)| a != b)
            {
                return Err(Error::InvalidInput(format!(
                    "{} timestamps differ from {} at index {}",
                    s.ticker(),
                    first.ticker(),
                    idx
                )));
            }
        }

        Ok(Self { series })
    }

    /// Build a universe from already-fetched histories, applying `policy` to
    /// tickers whose fetch failed or whose prices are invalid.
    pub fn assemble(
        fetched: Vec<(String, Result<PriceHistory>)>,
        policy: IncompletePolicy,
    ) -> Result<Self> {
        let mut series = Vec::with_capacity(fetched.len());

        for (ticker, history) in fetched {
            match history.and_then(|h| h.into_series(&ticker)) {
                Ok(s) => series.push(s),
                Err(e) => match policy {
                    IncompletePolicy::Exclude => {
                        tracing::warn!("Excluding {} from universe: {}", ticker, e);
                    }
                    IncompletePolicy::Reject => return Err(e),
                },
            }
        }

        if series.is_empty() {
            return Err(Error::DataUnavailable(
                "no ticker has usable price history".to_string(),
            ));
        }

        Self::new(series)
    }

    /// Fetch every ticker from `provider`, then assemble.
    pub fn fetch<P: PriceHistoryProvider + ?Sized>(
        provider: &P,
        tickers: &[String],
        policy: IncompletePolicy,
    ) -> Result<Self> {
        let fetched = tickers
            .iter()
            .map(|t| {
                let ticker = t.trim().to_uppercase();
                let history = provider.price_history(&ticker);
                (ticker, history)
            })
            .collect();
        Self::assemble(fetched, policy)
    }

    pub fn series(&self) -> &[PriceSeries] {
        &self.series
    }

    /// Tickers in universe order.
    pub fn tickers(&self) -> Vec<String> {
        self.series.iter().map(|s| s.ticker().to_string()).collect()
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn days(n: usize, offset: i64) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| start + Duration::days(i as i64 + offset))
            .collect()
    }

    fn history(close: Vec<f64>) -> PriceHistory {
        PriceHistory {
            timestamps: days(close.len(), 0),
            open: close.clone(),
            high: close.clone(),
            low: close.clone(),
            close,
        }
    }

    #[test]
    fn test_assemble_all_good() {
        let universe = Universe::assemble(
            vec![
                ("aaa".to_string(), Ok(history(vec![1.0, 2.0, 3.0]))),
                ("bbb".to_string(), Ok(history(vec![3.0, 2.0, 1.0]))),
            ],
            IncompletePolicy::Reject,
        )
        .unwrap();
        assert_eq!(universe.tickers(), vec!["AAA", "BBB"]);
        assert_eq!(universe.len(), 2);
    }

    #[test]
    fn test_assemble_excludes_incomplete() {
        let universe = Universe::assemble(
            vec![
                ("AAA".to_string(), Ok(history(vec![1.0, 2.0, 3.0]))),
                (
                    "GONE".to_string(),
                    Err(Error::DataUnavailable("no data".to_string())),
                ),
                ("BAD".to_string(), Ok(history(vec![1.0, -2.0, 3.0]))),
                ("SHORT".to_string(), Ok(history(vec![1.0]))),
            ],
            IncompletePolicy::Exclude,
        )
        .unwrap();
        assert_eq!(universe.tickers(), vec!["AAA"]);
    }

    #[test]
    fn test_assemble_rejects_incomplete() {
        let result = Universe::assemble(
            vec![
                ("AAA".to_string(), Ok(history(vec![1.0, 2.0, 3.0]))),
                (
                    "GONE".to_string(),
                    Err(Error::DataUnavailable("no data".to_string())),
                ),
            ],
            IncompletePolicy::Reject,
        );
        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn test_assemble_nothing_usable() {
        let result = Universe::assemble(
            vec![(
                "GONE".to_string(),
                Err(Error::DataUnavailable("no data".to_string())),
            )],
            IncompletePolicy::Exclude,
        );
        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn test_ragged_histories_always_fail() {
        let result = Universe::assemble(
            vec![
                ("AAA".to_string(), Ok(history(vec![1.0, 2.0, 3.0]))),
                ("BBB".to_string(), Ok(history(vec![1.0, 2.0, 3.0, 4.0]))),
            ],
            IncompletePolicy::Exclude,
        );
        assert!(matches!(
            result,
            Err(Error::MisalignedSeries {
                expected: 3,
                found: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_shifted_timestamps_fail() {
        let a = PriceSeries::new("AAA", days(3, 0), vec![1.0, 2.0, 3.0]).unwrap();
        let b = PriceSeries::new("BBB", days(3, 1), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            Universe::new(vec![a, b]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_duplicate_tickers_fail() {
        let a = PriceSeries::new("AAA", days(3, 0), vec![1.0, 2.0, 3.0]).unwrap();
        let b = PriceSeries::new("aaa", days(3, 0), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            Universe::new(vec![a, b]),
            Err(Error::InvalidInput(_))
        ));
    }
}
