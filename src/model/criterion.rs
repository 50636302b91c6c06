//! Criterion-based entry matching
//!
//! A [`Criterion`] is the caller's query as received (kind plus a string
//! value). Compiling it into a [`Predicate`] parses the numeric literal once,
//! so a malformed literal fails the whole query up front instead of being
//! treated as "no match".
//!
//! On pie series the x field is the slice label, so `ByX` compares labels
//! there and takes any text.

use crate::error::Result;
use crate::model::entry::{Entry, SeriesShape};
use crate::types::{parse_number, Value};
use serde::{Deserialize, Serialize};

/// Which entry field a criterion selects on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriterionKind {
    /// Every entry matches
    All,
    /// x value (bar categories are floored)
    ByX,
    /// y value
    ByY,
    /// Pie slice label
    ByLabel,
}

/// Query predicate as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub kind: CriterionKind,
    pub value: String,
}

impl Criterion {
    pub fn new(kind: CriterionKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Criterion matching every entry
    pub fn all() -> Self {
        Self::new(CriterionKind::All, "")
    }

    pub fn by_x(value: impl Into<String>) -> Self {
        Self::new(CriterionKind::ByX, value)
    }

    pub fn by_y(value: impl Into<String>) -> Self {
        Self::new(CriterionKind::ByY, value)
    }

    pub fn by_label(value: impl Into<String>) -> Self {
        Self::new(CriterionKind::ByLabel, value)
    }

    /// Parse the criterion value into a reusable predicate for numeric-x series
    pub fn compile(&self) -> Result<Predicate> {
        Ok(match self.kind {
            CriterionKind::All => Predicate::All,
            CriterionKind::ByX => Predicate::X(parse_number(&self.value)?),
            CriterionKind::ByY => Predicate::Y(parse_number(&self.value)?),
            CriterionKind::ByLabel => Predicate::Label(self.label_key()),
        })
    }

    /// Compile for a series of `shape`
    ///
    /// `ByX` becomes a label comparison when the shape's x field is a label.
    pub fn compile_for<S: SeriesShape + ?Sized>(&self, shape: &S) -> Result<Predicate> {
        match self.kind {
            CriterionKind::ByX if shape.x_is_label() => Ok(Predicate::Label(self.label_key())),
            _ => self.compile(),
        }
    }

    /// Whether `entry` satisfies this criterion
    pub fn matches(&self, entry: &Entry) -> Result<bool> {
        match (self.kind, entry) {
            (CriterionKind::ByX, Entry::Pie { label, .. }) => Ok(*label == self.label_key()),
            _ => Ok(self.compile()?.matches(entry)),
        }
    }

    /// The value as a pie label key (numeric text is normalised)
    fn label_key(&self) -> String {
        Value::from(self.value.as_str()).canonical_string()
    }
}

/// A criterion with its literal already parsed
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All,
    X(f64),
    Y(f64),
    Label(String),
}

impl Predicate {
    pub fn matches(&self, entry: &Entry) -> bool {
        match (self, entry) {
            (Predicate::All, _) => true,
            (Predicate::X(x), Entry::Cartesian { x: ex, .. }) => ex == x,
            (Predicate::X(x), Entry::Bar { category, .. }) => category.floor() == *x,
            (Predicate::X(_), Entry::Pie { .. }) => false,
            (Predicate::Y(y), entry) => entry.y() == *y,
            (Predicate::Label(label), Entry::Pie { label: el, .. }) => el == label,
            (Predicate::Label(_), Entry::Cartesian { .. } | Entry::Bar { .. }) => false,
        }
    }
}
