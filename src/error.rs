//! Error handling for chartdata-rs
//!
//! This module defines the crate-wide error type and a Result alias.
//! Every contract violation, parse failure and degenerate numeric case is
//! reported as a distinct variant so callers can tell them apart.

use std::time::Duration;
use thiserror::Error;

/// Main error type for chartdata-rs operations
#[derive(Error, Debug)]
pub enum ChartDataError {
    /// A tuple does not have the arity or field types the series expects
    #[error("Invalid tuple shape: {0}")]
    InvalidTupleShape(String),

    /// A criterion or imported field could not be parsed as a number
    #[error("Invalid numeric literal: {0:?}")]
    InvalidNumericLiteral(String),

    /// Paired numeric arrays are empty or differ in length
    #[error("Empty or mismatched input: {xs} x values, {ys} y values")]
    EmptyOrMismatchedInput { xs: usize, ys: usize },

    /// Input is well-formed but the model is undefined for it
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// A required sample array is empty
    #[error("Empty input")]
    EmptyInput,

    /// All samples are equal, so z-scores are undefined
    #[error("Zero variance: all samples are equal")]
    ZeroVariance,

    /// A 1-based index is outside its array, or parallel arrays disagree in length
    #[error("Index {index} out of range for arrays of length {len_x} and {len_y}")]
    IndexOutOfRange {
        index: usize,
        len_x: usize,
        len_y: usize,
    },

    /// A NaN or infinite value reached a numeric algorithm
    #[error("Non-finite value at position {0}")]
    NonFiniteInput(usize),

    /// A cross-context query got no reply in time
    #[error("Timeout: no reply from the owning context after {0:?}")]
    BridgeTimeout(Duration),

    /// The owning context has stopped
    #[error("Channel error: owning context is gone")]
    BridgeDisconnected,

    /// A blocking query was issued from the owning context itself
    #[error("Blocking query issued from the owning context")]
    OwningContext,

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ChartDataError>,
    },
}

impl ChartDataError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ChartDataError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &ChartDataError {
        match self {
            ChartDataError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for chartdata-rs operations
pub type Result<T> = std::result::Result<T, ChartDataError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
