//! # chartdata-rs: Chart Series Data Kernel
//!
//! The data layer behind a charting component: it stores the points of
//! each chart series, answers queries over them, and runs the trendline
//! and anomaly analyses drawn on top of them. Rendering is left to the
//! caller, which is told when a series changes and re-reads it.
//!
//! ## Architecture
//!
//! - **Model**: [`SeriesStore`] keeps the ordered entries of one series,
//!   generic over a [`SeriesShape`] (cartesian, pie or bar) that converts
//!   between caller tuples and internal [`Entry`] values
//! - **Analysis**: Linear least-squares trendlines and z-score anomaly
//!   detection over plain numeric arrays
//! - **Bridge**: A crossbeam channel between threads and the context that
//!   owns a store, with bounded waits for blocking queries
//! - **Config**: Window, timeout and analysis defaults loaded from JSON or TOML
//!
//! ## Example
//!
//! ```ignore
//! use chartdata_rs::{CartesianShape, Criterion, LinearRegression, SeriesStore, Tuple};
//!
//! let mut store = SeriesStore::new(CartesianShape);
//! store.insert(&Tuple::pair(1.0, 2.0))?;
//! store.insert(&Tuple::pair(2.0, 4.0))?;
//!
//! let found: Vec<Tuple> = store.find(&Criterion::by_x("2"))?.collect();
//!
//! let fit = LinearRegression::new().fit(&[1.0, 2.0], &[2.0, 4.0])?;
//! assert_eq!(fit.slope, 2.0);
//! ```

pub mod analysis;
pub mod bridge;
pub mod config;
pub mod error;
pub mod model;
pub mod types;

// Re-export commonly used types
pub use analysis::{Anomaly, AnomalyDetector, LinearFit, LinearRegression, TrendlineCalculator};
pub use bridge::{StoreHandle, StoreWorker};
pub use config::ChartDataConfig;
pub use error::{ChartDataError, Result};
pub use model::{
    BarShape, CartesianShape, ChartType, Criterion, CriterionKind, DataObserver, DynShape, Entry,
    PieShape, SeriesShape, SeriesStore,
};
pub use types::{Point, RawElement, Tuple, Value};
