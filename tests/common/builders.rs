//! Test data builders for creating test objects

use chartdata_rs::{SeriesShape, SeriesStore, Tuple};

/// Builder for creating pre-filled series stores
pub struct SeriesBuilder<S: SeriesShape> {
    shape: S,
    max_window: Option<usize>,
    tuples: Vec<Tuple>,
}

impl<S: SeriesShape> SeriesBuilder<S> {
    pub fn new(shape: S) -> Self {
        Self {
            shape,
            max_window: None,
            tuples: Vec::new(),
        }
    }

    pub fn max_window(mut self, max_window: usize) -> Self {
        self.max_window = Some(max_window);
        self
    }

    pub fn tuple(mut self, tuple: Tuple) -> Self {
        self.tuples.push(tuple);
        self
    }

    /// Add numeric `(x, y)` pairs
    pub fn pairs(mut self, pairs: &[(f64, f64)]) -> Self {
        self.tuples
            .extend(pairs.iter().map(|&(x, y)| Tuple::pair(x, y)));
        self
    }

    pub fn build(self) -> SeriesStore<S> {
        let mut store = SeriesStore::new(self.shape);
        if let Some(max_window) = self.max_window {
            store.set_max_window(max_window);
        }
        for tuple in &self.tuples {
            store.insert(tuple).unwrap();
        }
        store
    }
}

/// Numeric pairs as tuples
pub fn pairs(pairs: &[(f64, f64)]) -> Vec<Tuple> {
    pairs.iter().map(|&(x, y)| Tuple::pair(x, y)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartdata_rs::CartesianShape;

    #[test]
    fn test_series_builder() {
        let store = SeriesBuilder::new(CartesianShape)
            .max_window(10)
            .pairs(&[(1.0, 2.0), (3.0, 4.0)])
            .build();

        assert_eq!(store.len(), 2);
        assert_eq!(store.max_window(), 10);
        assert_eq!(store.entries_as_tuples(), pairs(&[(1.0, 2.0), (3.0, 4.0)]));
    }
}
