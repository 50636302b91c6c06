//! Analysis over chart data
//!
//! This module provides the numeric tools run on a series' samples:
//! - Linear least-squares trendlines
//! - Z-score anomaly detection and cleaning
//!
//! Everything here is stateless and safe to call from any thread.

pub mod anomaly;
pub mod regression;

pub use anomaly::{clean_at, clean_pairs, Anomaly, AnomalyDetector};
pub use regression::{
    sample_points, LinearFit, LinearRegression, TrendlineCalculator, TrendlineResults,
};

/// Power of two that brings the largest magnitude in `values` into `[1, 2)`
///
/// Dividing by it is exact, so results match the unscaled arithmetic
/// wherever that did not overflow.
pub(crate) fn unit_scale(values: &[f64]) -> f64 {
    let max_abs = values.iter().fold(0.0_f64, |max, v| max.max(v.abs()));
    if max_abs == 0.0 || !max_abs.is_finite() {
        1.0
    } else {
        max_abs.log2().floor().exp2()
    }
}
