//! Z-score anomaly detection
//!
//! Flags samples that lie far from the mean of their series, measured in
//! population standard deviations, and removes flagged samples from paired
//! x/y arrays.
//!
//! # Main Types
//!
//! - [`AnomalyDetector`] - Detector with a configured threshold
//! - [`Anomaly`] - A flagged sample (1-based index and value)
//!
//! Indices are 1-based throughout this module, matching how chart blocks
//! number list items.

use super::unit_scale;
use crate::config::AnalysisSettings;
use crate::error::{ChartDataError, Result};
use crate::types::Point;
use serde::{Deserialize, Serialize};

/// A sample whose z-score reached the threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// 1-based position in the input
    pub index: usize,
    pub value: f64,
}

/// Mean and population standard deviation of `samples`
fn statistics(samples: &[f64]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|&s| (s - mean) * (s - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Find every sample with `|sample - mean| / stddev >= threshold`
///
/// Results keep input order. Fails with [`ChartDataError::EmptyInput`] for
/// no samples and [`ChartDataError::ZeroVariance`] when every sample is
/// equal. A sample sitting exactly on the mean (z of 0) is never flagged,
/// even with a threshold of 0.
pub fn detect(samples: &[f64], threshold: f64) -> Result<Vec<Anomaly>> {
    if samples.is_empty() {
        return Err(ChartDataError::EmptyInput);
    }
    if let Some(position) = samples.iter().position(|s| !s.is_finite()) {
        return Err(ChartDataError::NonFiniteInput(position));
    }
    if samples.windows(2).all(|w| w[0] == w[1]) {
        return Err(ChartDataError::ZeroVariance);
    }

    // z-scores do not depend on scale; scaling keeps the variance finite
    let scale = unit_scale(samples);
    let scaled: Vec<f64> = samples.iter().map(|&s| s / scale).collect();
    let (mean, std_dev) = statistics(&scaled);
    if std_dev == 0.0 {
        return Err(ChartDataError::ZeroVariance);
    }
    if !mean.is_finite() || !std_dev.is_finite() {
        return Err(ChartDataError::DegenerateInput(
            "sample statistics are not finite".to_string(),
        ));
    }

    // Inclusive: with n samples the largest reachable z is sqrt(n - 1)
    let anomalies = scaled
        .iter()
        .zip(samples)
        .enumerate()
        .filter(|&(_, (&s, _))| {
            let z = (s - mean).abs() / std_dev;
            z > 0.0 && z >= threshold
        })
        .map(|(i, (_, &value))| Anomaly { index: i + 1, value })
        .collect();
    Ok(anomalies)
}

/// Run [`detect`] on the y values of `points`, returning the offending points
pub fn detect_points(points: &[Point], threshold: f64) -> Result<Vec<Point>> {
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    let anomalies = detect(&ys, threshold)?;
    Ok(anomalies
        .iter()
        .map(|a| Point::new(points[a.index - 1].x, a.value))
        .collect())
}

/// Remove the element at 1-based `index` from both parallel arrays
///
/// Fails with [`ChartDataError::IndexOutOfRange`] when `index` is outside
/// `[1, xs.len()]` or the arrays differ in length.
pub fn clean_at(index: usize, xs: &[f64], ys: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    if xs.len() != ys.len() || index == 0 || index > xs.len() {
        return Err(ChartDataError::IndexOutOfRange {
            index,
            len_x: xs.len(),
            len_y: ys.len(),
        });
    }
    let without = |values: &[f64]| -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index - 1)
            .map(|(_, &v)| v)
            .collect()
    };
    Ok((without(xs), without(ys)))
}

/// [`clean_at`], with the remaining pairs zipped into points
pub fn clean_pairs(index: usize, xs: &[f64], ys: &[f64]) -> Result<Vec<Point>> {
    let (xs, ys) = clean_at(index, xs, ys)?;
    Ok(xs.into_iter().zip(ys).map(|(x, y)| Point::new(x, y)).collect())
}

/// Anomaly detector bound to a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::from_settings(&AnalysisSettings::default())
    }
}

impl AnomalyDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Detector using the configured default threshold
    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self::new(settings.anomaly_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Flag anomalous samples
    pub fn detect(&self, samples: &[f64]) -> Result<Vec<Anomaly>> {
        let anomalies = detect(samples, self.threshold)?;
        tracing::debug!(
            "Flagged {} of {} samples at threshold {}",
            anomalies.len(),
            samples.len(),
            self.threshold
        );
        Ok(anomalies)
    }

    /// Flag anomalous chart points by their y value
    pub fn detect_points(&self, points: &[Point]) -> Result<Vec<Point>> {
        detect_points(points, self.threshold)
    }
}
