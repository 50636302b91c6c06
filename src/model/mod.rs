//! Series data model
//!
//! This module holds the per-series data kernel:
//! - [`Entry`] and the [`SeriesShape`] capability (cartesian, pie, bar)
//! - [`SeriesStore`], the ordered, optionally windowed entry collection
//! - [`Criterion`] queries over entries
//! - Column and element-string import helpers
//! - The [`DataObserver`] change notification

pub mod criterion;
pub mod entry;
pub mod import;
pub mod observer;
pub mod store;

pub use criterion::{Criterion, CriterionKind, Predicate};
pub use entry::{BarShape, CartesianShape, ChartType, DynShape, Entry, PieShape, SeriesShape};
pub use import::Column;
pub use observer::DataObserver;
pub use store::{ImportSummary, Matches, SeriesStore, DEFAULT_MAX_WINDOW};
