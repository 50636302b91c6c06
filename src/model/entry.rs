//! Entry representation and series shapes
//!
//! An [`Entry`] is the internal form of one data point. Which variant a
//! series holds is decided by its [`SeriesShape`], the capability that
//! converts caller tuples into entries and back.

use crate::error::{ChartDataError, Result};
use crate::types::{Tuple, Value};
use serde::{Deserialize, Serialize};

/// One data point, polymorphic over the supported series shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entry {
    /// Point on an x/y plane (line, scatter, area charts)
    Cartesian { x: f64, y: f64 },
    /// Labelled slice of a pie chart
    Pie { label: String, value: f64 },
    /// Bar in a category; the category is integral when compared
    Bar { category: f64, value: f64 },
}

impl Entry {
    /// Convert back to the caller-facing tuple form
    pub fn to_tuple(&self) -> Tuple {
        match self {
            Entry::Cartesian { x, y } => Tuple::pair(*x, *y),
            Entry::Pie { label, value } => Tuple::pair(label.as_str(), *value),
            Entry::Bar { category, value } => Tuple::pair(*category, *value),
        }
    }

    /// The y-axis value (slice value for pie entries)
    pub fn y(&self) -> f64 {
        match self {
            Entry::Cartesian { y, .. } => *y,
            Entry::Pie { value, .. } | Entry::Bar { value, .. } => *value,
        }
    }

    /// The x-axis value, if the entry has one
    pub fn x(&self) -> Option<f64> {
        match self {
            Entry::Cartesian { x, .. } => Some(*x),
            Entry::Bar { category, .. } => Some(*category),
            Entry::Pie { .. } => None,
        }
    }
}

/// Capability each concrete series shape provides to the generic store
pub trait SeriesShape {
    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Number of fields a tuple of this shape carries
    fn arity(&self) -> usize {
        2
    }

    /// Whether the first field is a text label rather than a number
    fn x_is_label(&self) -> bool {
        false
    }

    /// Validate `tuple` and build the entry it describes
    fn entry_from_tuple(&self, tuple: &Tuple) -> Result<Entry>;

    /// Convert an entry of this shape back to a tuple
    fn tuple_from_entry(&self, entry: &Entry) -> Tuple {
        entry.to_tuple()
    }
}

fn check_arity(shape: &dyn SeriesShape, tuple: &Tuple) -> Result<()> {
    if tuple.len() != shape.arity() {
        return Err(ChartDataError::InvalidTupleShape(format!(
            "{} series expects {} fields, got {}",
            shape.name(),
            shape.arity(),
            tuple.len()
        )));
    }
    Ok(())
}

fn numeric_field(tuple: &Tuple, index: usize, field: &str) -> Result<f64> {
    tuple
        .get(index)
        .and_then(Value::as_number)
        .ok_or_else(|| {
            ChartDataError::InvalidTupleShape(format!(
                "field {} ({}) is not a finite number in {}",
                index, field, tuple
            ))
        })
}

/// x/y points for line, scatter and area charts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartesianShape;

impl SeriesShape for CartesianShape {
    fn name(&self) -> &'static str {
        "cartesian"
    }

    fn entry_from_tuple(&self, tuple: &Tuple) -> Result<Entry> {
        check_arity(self, tuple)?;
        Ok(Entry::Cartesian {
            x: numeric_field(tuple, 0, "x")?,
            y: numeric_field(tuple, 1, "y")?,
        })
    }
}

/// (label, value) slices for pie charts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PieShape;

impl SeriesShape for PieShape {
    fn name(&self) -> &'static str {
        "pie"
    }

    fn x_is_label(&self) -> bool {
        true
    }

    fn entry_from_tuple(&self, tuple: &Tuple) -> Result<Entry> {
        check_arity(self, tuple)?;
        let label = tuple
            .get(0)
            .map(Value::canonical_string)
            .unwrap_or_default();
        Ok(Entry::Pie {
            label,
            value: numeric_field(tuple, 1, "value")?,
        })
    }
}

/// (category, value) bars for bar charts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BarShape;

impl SeriesShape for BarShape {
    fn name(&self) -> &'static str {
        "bar"
    }

    fn entry_from_tuple(&self, tuple: &Tuple) -> Result<Entry> {
        check_arity(self, tuple)?;
        Ok(Entry::Bar {
            category: numeric_field(tuple, 0, "category")?,
            value: numeric_field(tuple, 1, "value")?,
        })
    }
}

/// Shape chosen at runtime, e.g. from a chart type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynShape {
    Cartesian(CartesianShape),
    Pie(PieShape),
    Bar(BarShape),
}

impl SeriesShape for DynShape {
    fn name(&self) -> &'static str {
        match self {
            DynShape::Cartesian(s) => s.name(),
            DynShape::Pie(s) => s.name(),
            DynShape::Bar(s) => s.name(),
        }
    }

    fn arity(&self) -> usize {
        match self {
            DynShape::Cartesian(s) => s.arity(),
            DynShape::Pie(s) => s.arity(),
            DynShape::Bar(s) => s.arity(),
        }
    }

    fn x_is_label(&self) -> bool {
        matches!(self, DynShape::Pie(_))
    }

    fn entry_from_tuple(&self, tuple: &Tuple) -> Result<Entry> {
        match self {
            DynShape::Cartesian(s) => s.entry_from_tuple(tuple),
            DynShape::Pie(s) => s.entry_from_tuple(tuple),
            DynShape::Bar(s) => s.entry_from_tuple(tuple),
        }
    }
}

/// Kind of chart a series belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChartType {
    #[default]
    Line,
    Scatter,
    Area,
    Bar,
    Pie,
}

impl ChartType {
    /// Get all chart types
    pub fn all() -> &'static [ChartType] {
        &[
            ChartType::Line,
            ChartType::Scatter,
            ChartType::Area,
            ChartType::Bar,
            ChartType::Pie,
        ]
    }

    /// The series shape used by this chart type
    pub fn shape(&self) -> DynShape {
        match self {
            ChartType::Line | ChartType::Scatter | ChartType::Area => {
                DynShape::Cartesian(CartesianShape)
            }
            ChartType::Bar => DynShape::Bar(BarShape),
            ChartType::Pie => DynShape::Pie(PieShape),
        }
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartType::Line => write!(f, "Line"),
            ChartType::Scatter => write!(f, "Scatter"),
            ChartType::Area => write!(f, "Area"),
            ChartType::Bar => write!(f, "Bar"),
            ChartType::Pie => write!(f, "Pie"),
        }
    }
}
