//! Run configuration, loadable from TOML.
//!
//! Default path: `~/.config/tangency/config.toml`, overridable with the
//! `TANGENCY_CONFIG` environment variable. A missing file yields defaults.

use crate::frontier::MAX_GRID_POINTS;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// How sampling-phase weight vectors are drawn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    /// Independent `U(0,1)` draws renormalized to sum to one. Concentrates
    /// samples toward the centre of the simplex; it is not a uniform draw
    /// over the simplex.
    #[default]
    Normalized,
    /// Flat Dirichlet draw (normalized `Exp(1)` variates), uniform over the simplex.
    Dirichlet,
}

/// Settings for the sampling and refinement phases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Number of random portfolios drawn in the sampling phase
    pub num_simulations: usize,
    /// Gradient steps in the refinement phase (defaults to `num_simulations`)
    pub refinement_steps: Option<usize>,
    /// Gradient ascent step size
    pub step_size: f64,
    /// Step halvings tried before a refinement step is declared converged
    pub max_backtracks: u32,
    /// Weight sampling scheme
    pub weight_scheme: WeightScheme,
    /// Seed for reproducible sampling (entropy when unset)
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            num_simulations: 10_000,
            refinement_steps: None,
            step_size: 0.01,
            max_backtracks: 50,
            weight_scheme: WeightScheme::Normalized,
            seed: None,
        }
    }
}

impl OptimizerConfig {
    /// Effective number of refinement steps.
    pub fn refinement_steps(&self) -> usize {
        self.refinement_steps.unwrap_or(self.num_simulations)
    }

    /// Random source for a run: seeded when `seed` is set.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_simulations == 0 {
            return Err(Error::Config(
                "num_simulations must be at least 1".to_string(),
            ));
        }
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(Error::Config(format!(
                "step_size must be positive, got {}",
                self.step_size
            )));
        }
        Ok(())
    }
}

/// Settings for frontier extraction and display series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrontierConfig {
    /// Degree of the smoothing polynomial (volatility as a function of return)
    pub poly_degree: usize,
    /// Return bucket width for the bucket envelope
    pub bucket_step: f64,
    /// Return spacing of the smoothed frontier curve
    pub curve_step: f64,
    /// Largest volatility drawn on the capital allocation line
    pub cal_max_volatility: f64,
    /// Volatility spacing of the capital allocation line
    pub cal_step: f64,
    /// Cap on sample-cloud points handed to a renderer
    pub max_cloud_points: usize,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            poly_degree: 2,
            bucket_step: 0.002,
            curve_step: 0.002,
            cal_max_volatility: 1.5,
            cal_step: 0.01,
            max_cloud_points: 100,
        }
    }
}

impl FrontierConfig {
    /// Highest polynomial degree accepted.
    pub const MAX_DEGREE: usize = 10;

    pub fn validate(&self) -> Result<()> {
        if self.poly_degree > Self::MAX_DEGREE {
            return Err(Error::Config(format!(
                "poly_degree must be at most {}, got {}",
                Self::MAX_DEGREE,
                self.poly_degree
            )));
        }
        for (name, value) in [
            ("bucket_step", self.bucket_step),
            ("curve_step", self.curve_step),
            ("cal_step", self.cal_step),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !self.cal_max_volatility.is_finite() || self.cal_max_volatility < 0.0 {
            return Err(Error::Config(format!(
                "cal_max_volatility must be non-negative, got {}",
                self.cal_max_volatility
            )));
        }
        if self.cal_max_volatility / self.cal_step >= MAX_GRID_POINTS as f64 {
            return Err(Error::Config(format!(
                "cal_step {} is too small for cal_max_volatility {} (at most {} points)",
                self.cal_step, self.cal_max_volatility, MAX_GRID_POINTS
            )));
        }
        if self.max_cloud_points == 0 {
            return Err(Error::Config(
                "max_cloud_points must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub optimizer: OptimizerConfig,
    pub frontier: FrontierConfig,
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default path: `~/.config/tangency/config.toml`
    /// Can be overridden with `TANGENCY_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("TANGENCY_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("tangency/config.toml"))
            .unwrap_or_else(|| PathBuf::from("tangency.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path; a missing file gives the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.optimizer.validate()?;
        self.frontier.validate()
    }
}
