//! Display series for a finished analysis.
//!
//! [`ChartData`] gathers everything a renderer draws: the individual assets,
//! a thinned sample cloud, the frontier (raw, smoothed and bucket outline),
//! the capital allocation line, the tangency marker and optionally the
//! growth-of-$1 indices. Nothing here feeds back into the weights.

use crate::allocation::GrowthIndex;
use crate::config::FrontierConfig;
use crate::frontier::{BucketEnvelope, Curve};
use crate::providers::RenderSink;
use crate::types::{PortfolioSample, ReturnStats};
use crate::{Analysis, Error, Result};
use serde::Serialize;
use std::io::Write;

/// Renderer input for one analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    /// One point per asset
    pub assets: Vec<ReturnStats>,
    /// Every k-th sampling-phase portfolio
    pub cloud: Vec<PortfolioSample>,
    /// Upper-frontier staircase
    pub frontier: Curve,
    /// Polynomial-smoothed frontier, or the staircase when `smoothed` is false
    pub smoothed_frontier: Curve,
    /// False when the polynomial fit was singular and `smoothed_frontier`
    /// repeats the raw staircase
    pub smoothed: bool,
    /// Bucket outline of the full cloud
    pub envelope: BucketEnvelope,
    /// Capital allocation line
    pub cal: Curve,
    /// Maximum-Sharpe portfolio
    pub tangency: PortfolioSample,
    pub risk_free_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth: Option<GrowthIndex>,
}

impl ChartData {
    pub fn build(
        analysis: &Analysis,
        growth: Option<GrowthIndex>,
        config: &FrontierConfig,
    ) -> Result<Self> {
        config.validate()?;
        let frontier = &analysis.frontier;
        let samples = &analysis.result.samples;

        // A short frontier cannot support the configured degree
        let degree = config
            .poly_degree
            .min(frontier.returns.len().saturating_sub(1));
        let smoothing = frontier.smoothed_curve(degree, config.curve_step);
        let (smoothed_frontier, smoothed) = match smoothing {
            Ok(curve) => (curve, true),
            Err(Error::SingularMatrix(col)) => {
                tracing::warn!(
                    "Frontier smoothing singular at column {}, drawing the raw staircase",
                    col
                );
                (frontier.curve(), false)
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            assets: analysis.stats.clone(),
            cloud: thin(samples, config.max_cloud_points),
            frontier: frontier.curve(),
            smoothed_frontier,
            smoothed,
            envelope: BucketEnvelope::from_samples(samples, config.bucket_step),
            cal: frontier.cal_line(config.cal_max_volatility, config.cal_step)?,
            tangency: frontier.tangency.clone(),
            risk_free_rate: frontier.risk_free_rate,
            growth,
        })
    }

    /// Hand the chart to a sink.
    pub fn render_to<S: RenderSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.render(self)
    }
}

/// Keep every `ceil(len / max_points)`-th sample, starting with the first.
pub fn thin(samples: &[PortfolioSample], max_points: usize) -> Vec<PortfolioSample> {
    if samples.is_empty() || max_points == 0 {
        return Vec::new();
    }
    let stride = samples.len().div_ceil(max_points);
    samples.iter().step_by(stride).cloned().collect()
}

/// Writes chart data as pretty-printed JSON.
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for JsonSink<W> {
    fn render(&mut self, chart: &ChartData) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, chart)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
