//! Trendline fitting
//!
//! Provides trendline models for chart data:
//! - The [`TrendlineCalculator`] trait shared by all models
//! - [`LinearRegression`], ordinary least squares on paired samples
//! - [`TrendlineResults`], the keyed result map handed to the renderer
//!
//! Models are stateless; a single instance can be shared freely across
//! threads.

use super::unit_scale;
use crate::config::AnalysisSettings;
use crate::error::{ChartDataError, Result};
use crate::types::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys used in linear [`TrendlineResults`]
pub mod keys {
    pub const SLOPE: &str = "slope";
    pub const INTERCEPT: &str = "intercept";
    pub const CORRELATION: &str = "correlation";
    pub const R_SQUARED: &str = "rSquared";
    pub const X_INTERCEPT: &str = "xIntercept";
}

/// Keyed output of a trendline model
///
/// Which keys are present depends on the model. A key that is undefined for
/// the given input (e.g. `xIntercept` of a flat line) is absent rather than
/// stored as NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrendlineResults(BTreeMap<String, f64>);

impl TrendlineResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Store a value under `key`
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A model that can be fitted to chart data and drawn as a trendline
pub trait TrendlineCalculator {
    /// Fit the model to paired samples; `xs` and `ys` must be the same non-zero length
    fn compute(&self, xs: &[f64], ys: &[f64]) -> Result<TrendlineResults>;

    /// Points describing the fitted trendline across `[x_min, x_max]`
    ///
    /// `view_width` is the chart width in pixels and `steps` the number of
    /// segments to sample for curved models. Returns an empty vector when
    /// `results` lacks a key the model needs.
    fn compute_points(
        &self,
        results: &TrendlineResults,
        x_min: f64,
        x_max: f64,
        view_width: u32,
        steps: usize,
    ) -> Vec<Point>;

    /// Fit `xs`/`ys` and draw the result across `[x_min, x_max]`
    ///
    /// Curved models are sampled with the configured `trendline_steps`.
    fn trendline(
        &self,
        xs: &[f64],
        ys: &[f64],
        x_min: f64,
        x_max: f64,
        view_width: u32,
        settings: &AnalysisSettings,
    ) -> Result<Vec<Point>> {
        let results = self.compute(xs, ys)?;
        Ok(self.compute_points(&results, x_min, x_max, view_width, settings.trendline_steps))
    }
}

/// Evaluate `model` at `steps + 1` evenly spaced x values in `[x_min, x_max]`
pub fn sample_points(model: impl Fn(f64) -> f64, x_min: f64, x_max: f64, steps: usize) -> Vec<Point> {
    if !valid_range(x_min, x_max) {
        return Vec::new();
    }
    let steps = steps.max(1);
    let dx = (x_max - x_min) / steps as f64;
    (0..=steps)
        .map(|i| {
            // Pin the last sample so rounding never overshoots the edge
            let x = if i == steps { x_max } else { x_min + dx * i as f64 };
            Point::new(x, model(x))
        })
        .collect()
}

fn valid_range(x_min: f64, x_max: f64) -> bool {
    x_min.is_finite() && x_max.is_finite() && x_min <= x_max
}

/// Least-squares line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation; `None` when x or y has no variance
    pub correlation: Option<f64>,
    pub r_squared: Option<f64>,
    /// Where the line crosses y = 0; `None` when the slope is zero
    pub x_intercept: Option<f64>,
}

impl LinearFit {
    /// Predicted y at `x`
    #[inline]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Predicted y for each x
    pub fn predictions(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.predict(x)).collect()
    }

    /// Rebuild a fit from a result map; `None` if slope or intercept is missing
    pub fn from_results(results: &TrendlineResults) -> Option<Self> {
        let correlation = results.get(keys::CORRELATION);
        Some(Self {
            slope: results.get(keys::SLOPE)?,
            intercept: results.get(keys::INTERCEPT)?,
            correlation,
            r_squared: results.get(keys::R_SQUARED).or(correlation.map(|r| r * r)),
            x_intercept: results.get(keys::X_INTERCEPT),
        })
    }
}

impl From<LinearFit> for TrendlineResults {
    fn from(fit: LinearFit) -> Self {
        let mut results = TrendlineResults::new();
        results.insert(keys::SLOPE, fit.slope);
        results.insert(keys::INTERCEPT, fit.intercept);
        if let Some(r) = fit.correlation {
            results.insert(keys::CORRELATION, r);
        }
        if let Some(r2) = fit.r_squared {
            results.insert(keys::R_SQUARED, r2);
        }
        if let Some(x0) = fit.x_intercept {
            results.insert(keys::X_INTERCEPT, x0);
        }
        results
    }
}

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(position) => Err(ChartDataError::NonFiniteInput(position)),
        None => Ok(()),
    }
}

fn all_equal(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Ordinary least-squares linear regression
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRegression;

impl LinearRegression {
    pub fn new() -> Self {
        Self
    }

    /// Fit a line to paired samples
    ///
    /// Fails with [`ChartDataError::EmptyOrMismatchedInput`] for empty or
    /// unequal inputs and [`ChartDataError::DegenerateInput`] when every x is
    /// the same (the slope would divide by zero) or the fitted line does not
    /// fit in an `f64`.
    pub fn fit(&self, xs: &[f64], ys: &[f64]) -> Result<LinearFit> {
        if xs.is_empty() || xs.len() != ys.len() {
            return Err(ChartDataError::EmptyOrMismatchedInput {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        check_finite(xs)?;
        check_finite(ys)?;

        // Least squares on power-of-two scaled data, so the sums stay finite
        let x_scale = unit_scale(xs);
        let y_scale = unit_scale(ys);
        let xs_s: Vec<f64> = xs.iter().map(|&x| x / x_scale).collect();
        let ys_s: Vec<f64> = ys.iter().map(|&y| y / y_scale).collect();

        let n = xs.len() as f64;
        let x_mean = xs_s.iter().sum::<f64>() / n;
        let y_mean = ys_s.iter().sum::<f64>() / n;

        let sxx: f64 = xs_s.iter().map(|&x| (x - x_mean) * (x - x_mean)).sum();
        if all_equal(xs) || sxx == 0.0 {
            return Err(ChartDataError::DegenerateInput(
                "all x values are identical".to_string(),
            ));
        }
        let syy: f64 = ys_s.iter().map(|&y| (y - y_mean) * (y - y_mean)).sum();
        let sxy: f64 = xs_s
            .iter()
            .zip(&ys_s)
            .map(|(&x, &y)| (x - x_mean) * (y - y_mean))
            .sum();

        let scaled_slope = sxy / sxx;
        let slope = scaled_slope * (y_scale / x_scale);
        let intercept = (y_mean - scaled_slope * x_mean) * y_scale;
        if !slope.is_finite() || !intercept.is_finite() {
            return Err(ChartDataError::DegenerateInput(format!(
                "fitted line is not representable (slope {}, intercept {})",
                slope, intercept
            )));
        }

        let denominator = (sxx * syy).sqrt();
        let correlation = if all_equal(ys) || !(denominator > 0.0) {
            None
        } else {
            // Rounding can push |r| a hair past 1
            Some((sxy / denominator).clamp(-1.0, 1.0))
        };

        // A crossing beyond the f64 range is reported as none
        let x_intercept = Some(-intercept / slope).filter(|x| slope != 0.0 && x.is_finite());

        Ok(LinearFit {
            slope,
            intercept,
            correlation,
            r_squared: correlation.map(|r| r * r),
            x_intercept,
        })
    }
}

impl TrendlineCalculator for LinearRegression {
    fn compute(&self, xs: &[f64], ys: &[f64]) -> Result<TrendlineResults> {
        self.fit(xs, ys).map(TrendlineResults::from)
    }

    fn compute_points(
        &self,
        results: &TrendlineResults,
        x_min: f64,
        x_max: f64,
        _view_width: u32,
        _steps: usize,
    ) -> Vec<Point> {
        let Some(fit) = LinearFit::from_results(results) else {
            return Vec::new();
        };
        if !valid_range(x_min, x_max) {
            return Vec::new();
        }
        // A straight line is fully described by its two edge points
        vec![
            Point::new(x_min, fit.predict(x_min)),
            Point::new(x_max, fit.predict(x_max)),
        ]
    }
}
