//! Tuple builders for bulk import
//!
//! Import sources hand the kernel already-parsed data: parallel columns of
//! raw values, or a flat comma-separated element string. These helpers turn
//! either into tuples; the store then inserts them best-effort.

use crate::types::{Tuple, Value};
use serde::{Deserialize, Serialize};

/// One column of raw values from an import source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// A usable column
    Values(Vec<Value>),
    /// A column that could not be resolved (e.g. unknown header)
    Invalid,
}

impl Column {
    fn len(&self) -> Option<usize> {
        match self {
            Column::Values(values) => Some(values.len()),
            Column::Invalid => None,
        }
    }
}

impl From<Vec<Value>> for Column {
    fn from(values: Vec<Value>) -> Self {
        Column::Values(values)
    }
}

/// Placeholder for a field whose column is unusable: the data row index
pub fn placeholder(data_row: usize) -> Value {
    Value::Text(data_row.to_string())
}

/// Zip parallel columns into row tuples
///
/// Rows run up to the shortest valid column; row 0 is skipped when
/// `has_headers`. Invalid columns contribute [`placeholder`] values and do
/// not limit the row count. Without any valid column there are no rows.
pub fn tuples_from_columns(columns: &[Column], has_headers: bool) -> Vec<Tuple> {
    let rows = match columns.iter().filter_map(Column::len).min() {
        Some(rows) => rows,
        None => return Vec::new(),
    };
    let first = usize::from(has_headers);

    (first..rows)
        .map(|row| {
            Tuple::new(columns.iter().map(|column| match column {
                Column::Values(values) => values[row].clone(),
                Column::Invalid => placeholder(row - first),
            }))
        })
        .collect()
}

/// Split a comma-separated element string into tuples of `arity` fields
///
/// A trailing group with fewer than `arity` fields is dropped.
pub fn tuples_from_elements(elements: &str, arity: usize) -> Vec<Tuple> {
    if arity == 0 || elements.trim().is_empty() {
        return Vec::new();
    }
    let fields: Vec<&str> = elements.split(',').map(str::trim).collect();
    fields
        .chunks_exact(arity)
        .map(|chunk| Tuple::new(chunk.iter().copied()))
        .collect()
}
