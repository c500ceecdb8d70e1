//! Per-asset summary cards.
//!
//! Fundamentals are derived from the raw statistics and financial-data
//! modules of the fundamentals provider. Each displayed metric gets a
//! traffic-light rating.

use crate::types::ReturnStats;
use serde::{Deserialize, Serialize};

/// A provider value wrapped as `{ "raw": 1.23, "fmt": "1.23" }`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RawValue {
    pub raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

/// Fields read from the statistics module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StatisticsModule {
    #[serde(rename = "forwardPE")]
    pub forward_pe: Option<RawValue>,
    pub forward_eps: Option<RawValue>,
    #[serde(rename = "52WeekChange")]
    pub fifty_two_week_change: Option<RawValue>,
    pub profit_margins: Option<RawValue>,
    pub shares_outstanding: Option<RawValue>,
}

/// Fields read from the financial-data module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialDataModule {
    pub current_price: Option<RawValue>,
    pub earnings_growth: Option<RawValue>,
    pub free_cashflow: Option<RawValue>,
    pub debt_to_equity: Option<RawValue>,
}

/// Derived fundamentals for one ticker. Percent-valued fields are already
/// multiplied by 100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub ticker: String,
    pub peg_ratio: Option<f64>,
    pub fifty_two_week_change: Option<f64>,
    pub profit_margin: Option<f64>,
    pub free_cash_flow_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub price: Option<f64>,
}

impl Fundamentals {
    /// Derive fundamentals from the two raw modules.
    ///
    /// Forward P/E falls back to `price / forwardEps` when the provider omits
    /// it. A missing input or a zero denominator leaves the metric as `None`.
    pub fn derive(
        ticker: &str,
        statistics: &StatisticsModule,
        financial: &FinancialDataModule,
    ) -> Self {
        let price = raw(&financial.current_price);
        let shares = raw(&statistics.shares_outstanding);

        let forward_pe = raw(&statistics.forward_pe)
            .or_else(|| ratio(price, raw(&statistics.forward_eps)));
        let growth_pct = raw(&financial.earnings_growth).map(|g| g * 100.0);
        let market_cap = price.zip(shares).map(|(p, s)| p * s);

        Self {
            ticker: ticker.trim().to_uppercase(),
            peg_ratio: ratio(forward_pe, growth_pct),
            fifty_two_week_change: raw(&statistics.fifty_two_week_change).map(|v| v * 100.0),
            profit_margin: raw(&statistics.profit_margins).map(|v| v * 100.0),
            free_cash_flow_yield: ratio(
                raw(&financial.free_cashflow).map(|v| v * 100.0),
                market_cap,
            ),
            debt_to_equity: raw(&financial.debt_to_equity),
            price,
        }
    }
}

fn ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    match (num, den) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Traffic-light rating for a displayed metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Green,
    Yellow,
    Red,
    /// Value missing or not finite
    Unknown,
}

/// Metrics shown on an asset card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    AverageReturn,
    Volatility,
    SharpeRatio,
    PegRatio,
    FiftyTwoWeekChange,
    ProfitMargin,
    FreeCashFlowYield,
    DebtToEquity,
}

impl Metric {
    /// Rate a value of this metric.
    ///
    /// Return and volatility are decimal fractions; the fundamentals are in
    /// percent (debt to equity as the provider reports it).
    pub fn rate(self, value: Option<f64>) -> Rating {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            return Rating::Unknown;
        };

        let higher_is_better = |green: f64, yellow: f64| {
            if v > green {
                Rating::Green
            } else if v >= yellow {
                Rating::Yellow
            } else {
                Rating::Red
            }
        };
        let lower_is_better = |green: f64, yellow: f64| {
            if v < green {
                Rating::Green
            } else if v <= yellow {
                Rating::Yellow
            } else {
                Rating::Red
            }
        };

        match self {
            Metric::AverageReturn => higher_is_better(0.07, 0.0),
            Metric::Volatility => lower_is_better(0.15, 0.30),
            Metric::SharpeRatio => higher_is_better(1.0, 0.3),
            Metric::PegRatio if v <= 0.0 => Rating::Red,
            Metric::PegRatio => lower_is_better(1.0, 2.0),
            Metric::FiftyTwoWeekChange => higher_is_better(10.0, -10.0),
            Metric::ProfitMargin => higher_is_better(15.0, 5.0),
            Metric::FreeCashFlowYield => higher_is_better(5.0, 2.0),
            Metric::DebtToEquity => lower_is_better(50.0, 150.0),
        }
    }
}

/// One rated line on an asset card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRating {
    pub metric: Metric,
    pub value: Option<f64>,
    pub rating: Rating,
}

impl MetricRating {
    fn new(metric: Metric, value: Option<f64>) -> Self {
        Self {
            metric,
            value,
            rating: metric.rate(value),
        }
    }
}

/// Return statistics and fundamentals for one asset, with ratings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetCard {
    pub ticker: String,
    pub price: Option<f64>,
    pub stats: ReturnStats,
    pub fundamentals: Option<Fundamentals>,
    pub ratings: Vec<MetricRating>,
}

impl AssetCard {
    /// Build a card. Fundamentals are optional; their metrics are then rated
    /// [`Rating::Unknown`].
    pub fn new(stats: ReturnStats, fundamentals: Option<Fundamentals>) -> Self {
        let f = fundamentals.clone().unwrap_or_default();
        let ratings = vec![
            MetricRating::new(Metric::AverageReturn, Some(stats.average_return)),
            MetricRating::new(Metric::Volatility, Some(stats.volatility)),
            MetricRating::new(Metric::SharpeRatio, Some(stats.sharpe_ratio)),
            MetricRating::new(Metric::PegRatio, f.peg_ratio),
            MetricRating::new(Metric::FiftyTwoWeekChange, f.fifty_two_week_change),
            MetricRating::new(Metric::ProfitMargin, f.profit_margin),
            MetricRating::new(Metric::FreeCashFlowYield, f.free_cash_flow_yield),
            MetricRating::new(Metric::DebtToEquity, f.debt_to_equity),
        ];

        Self {
            ticker: stats.ticker.clone(),
            price: f.price,
            stats,
            fundamentals,
            ratings,
        }
    }

    /// Rating of a single metric.
    pub fn rating(&self, metric: Metric) -> Rating {
        self.ratings
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| r.rating)
            .unwrap_or(Rating::Unknown)
    }
}
