//! Core data types for chartdata-rs
//!
//! This module contains the values exchanged with callers of the kernel.
//!
//! # Main Types
//!
//! - [`Value`] - A scalar field: a number or a string
//! - [`Tuple`] - Fixed-arity ordered vector of values, one data point as the caller sees it
//! - [`RawElement`] - One element of a loosely-typed caller list (tuple, scalar or marker)
//! - [`Point`] - A drawable 2D point produced by the analysis algorithms
//!
//! # Equality
//!
//! Values compare by value, not by representation: the text `"1"` and the
//! number `1.0` are equal, so a tuple typed in as strings still matches the
//! numeric tuple the store hands back.

use crate::error::{ChartDataError, Result};
use serde::{Deserialize, Serialize};

/// Parse a numeric literal, rejecting NaN and infinities
pub fn parse_number(literal: &str) -> Result<f64> {
    match literal.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ChartDataError::InvalidNumericLiteral(literal.to_string())),
    }
}

/// A scalar value carried by a tuple
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric value
    Number(f64),
    /// String value (labels, or numbers typed in as text)
    Text(String),
}

impl Value {
    /// Numeric interpretation of this value, if it has one
    ///
    /// Text is accepted when it parses to a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s).ok(),
        }
    }

    /// Canonical string form (numbers print without a trailing `.0`)
    ///
    /// Numeric text is normalised too, so `"1.0"` and `1.0` both give `"1"`.
    pub fn canonical_string(&self) -> String {
        match self.as_number() {
            Some(n) => n.to_string(),
            None => self.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (Value::Text(a), Value::Text(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Fixed-arity ordered value vector
///
/// Immutable once constructed; equality is component-wise using [`Value`]
/// equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tuple(Vec<Value>);

impl Tuple {
    /// Create a tuple from any sequence of values
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    /// Create a 2-tuple
    pub fn pair(first: impl Into<Value>, second: impl Into<Value>) -> Self {
        Self(vec![first.into(), second.into()])
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the tuple has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// All fields in order
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Tuple {
    fn from((a, b): (A, B)) -> Self {
        Self::pair(a, b)
    }
}

/// One element of a loosely-typed caller list
///
/// Bulk operations accept lists whose elements are not all tuples; only
/// [`RawElement::List`] elements are acted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawElement {
    /// A nested list, interpreted as a tuple
    List(Vec<Value>),
    /// A bare scalar
    Scalar(Value),
    /// A symbolic marker (e.g. a list header symbol), serialized as `{"symbol": name}`
    Symbol(#[serde(with = "symbol_marker")] String),
}

mod symbol_marker {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Marker<T> {
        symbol: T,
    }

    pub fn serialize<S: Serializer>(symbol: &str, serializer: S) -> Result<S::Ok, S::Error> {
        Marker { symbol }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Marker::<String>::deserialize(deserializer).map(|marker| marker.symbol)
    }
}

impl RawElement {
    /// Interpret this element as a tuple, if it is a list
    pub fn as_tuple(&self) -> Option<Tuple> {
        match self {
            RawElement::List(values) => Some(Tuple(values.clone())),
            RawElement::Scalar(_) | RawElement::Symbol(_) => None,
        }
    }
}

impl From<Tuple> for RawElement {
    fn from(tuple: Tuple) -> Self {
        RawElement::List(tuple.0)
    }
}

/// A drawable 2D point in data coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point as a `[x, y]` pair for plotting
    pub fn as_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}
