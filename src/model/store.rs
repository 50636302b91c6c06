//! Ordered entry storage for one chart series
//!
//! [`SeriesStore`] keeps entries in insertion order (which is also draw
//! order). Lookups are linear scans: series are small, and a hashed index
//! would have to be kept in step with the ordering.
//!
//! # Windowed mode
//!
//! Live data goes through [`SeriesStore::insert_windowed`], which keeps at
//! most [`SeriesStore::max_window`] entries by evicting the oldest first.
//! The window is a per-instance setting ([`DEFAULT_MAX_WINDOW`] by default).
//!
//! # Notifications
//!
//! Every successful mutation fires [`DataObserver::on_data_changed`] once,
//! after the mutation is complete. A call that fails validation leaves the
//! store untouched and fires nothing.

use crate::config::StoreSettings;
use crate::error::Result;
use crate::model::criterion::{Criterion, Predicate};
use crate::model::entry::{Entry, SeriesShape};
use crate::model::import::{tuples_from_columns, tuples_from_elements, Column};
use crate::model::observer::DataObserver;
use crate::types::{RawElement, Tuple};
use std::collections::VecDeque;

/// Default number of entries retained in windowed mode
pub const DEFAULT_MAX_WINDOW: usize = 200;

/// Outcome of a best-effort bulk import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    /// Tuples inserted
    pub inserted: usize,
    /// Elements skipped because they were malformed or not tuples
    pub skipped: usize,
}

/// Ordered collection of entries for one logical series
pub struct SeriesStore<S: SeriesShape> {
    shape: S,
    entries: VecDeque<Entry>,
    max_window: usize,
    observer: Option<Box<dyn DataObserver>>,
}

impl<S: SeriesShape + std::fmt::Debug> std::fmt::Debug for SeriesStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesStore")
            .field("shape", &self.shape)
            .field("entries", &self.entries)
            .field("max_window", &self.max_window)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl<S: SeriesShape> SeriesStore<S> {
    /// Create an empty store with the default window
    pub fn new(shape: S) -> Self {
        Self {
            shape,
            entries: VecDeque::new(),
            max_window: DEFAULT_MAX_WINDOW,
            observer: None,
        }
    }

    /// Create an empty store using configured settings
    pub fn with_config(shape: S, settings: &StoreSettings) -> Self {
        let mut store = Self::new(shape);
        store.set_max_window(settings.max_window);
        store
    }

    /// Attach the observer that receives change notifications
    pub fn with_observer(mut self, observer: impl DataObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Replace (or remove) the change observer
    pub fn set_observer(&mut self, observer: Option<Box<dyn DataObserver>>) {
        self.observer = observer;
    }

    /// The shape this series converts tuples with
    pub fn shape(&self) -> &S {
        &self.shape
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum entries retained by windowed inserts
    pub fn max_window(&self) -> usize {
        self.max_window
    }

    /// Change the window; values below 1 are raised to 1
    ///
    /// Existing entries are not trimmed until the next windowed insert.
    pub fn set_max_window(&mut self, max_window: usize) {
        self.max_window = max_window.max(1);
    }

    /// Entries in draw order
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &Entry> + Clone + '_ {
        self.entries.iter()
    }

    /// Entry at `index`, if in range
    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Convert and append `tuple`
    pub fn insert(&mut self, tuple: &Tuple) -> Result<()> {
        let entry = self.shape.entry_from_tuple(tuple)?;
        self.insert_entry(entry);
        Ok(())
    }

    /// Convert and append `tuple`, evicting the oldest entries to stay within the window
    pub fn insert_windowed(&mut self, tuple: &Tuple) -> Result<()> {
        let entry = self.shape.entry_from_tuple(tuple)?;
        self.insert_entry_windowed(entry);
        Ok(())
    }

    /// Append an entry already validated against this store's shape
    pub(crate) fn insert_entry(&mut self, entry: Entry) {
        self.entries.push_back(entry);
        self.notify();
    }

    pub(crate) fn insert_entry_windowed(&mut self, entry: Entry) {
        while self.entries.len() >= self.max_window {
            if let Some(evicted) = self.entries.pop_front() {
                tracing::debug!("Window full ({}), evicted {:?}", self.max_window, evicted);
            }
        }
        self.entries.push_back(entry);
        self.notify();
    }

    /// Index of the first entry structurally equal to `entry`
    pub fn position(&self, entry: &Entry) -> Option<usize> {
        self.entries.iter().position(|e| e == entry)
    }

    fn position_of_tuple(&self, tuple: &Tuple) -> Option<usize> {
        // A tuple that does not convert cannot match any stored entry
        let entry = self.shape.entry_from_tuple(tuple).ok()?;
        self.position(&entry)
    }

    /// Remove the first entry equal to `tuple`; false when nothing matches
    pub fn remove_by_tuple(&mut self, tuple: &Tuple) -> bool {
        match self.position_of_tuple(tuple) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    /// Whether an entry equal to `tuple` is stored
    pub fn exists_by_tuple(&self, tuple: &Tuple) -> bool {
        self.position_of_tuple(tuple).is_some()
    }

    /// Remove the entry at `index`; out-of-range indices are a no-op
    pub fn remove_at(&mut self, index: usize) -> Option<Entry> {
        let removed = self.entries.remove(index)?;
        self.notify();
        Some(removed)
    }

    /// Lazily yield the tuples of all entries matching `criterion`
    ///
    /// Fails before yielding anything if the criterion literal is malformed.
    /// The returned iterator can be cloned to restart from the beginning.
    pub fn find(&self, criterion: &Criterion) -> Result<Matches<'_, S>> {
        Ok(Matches {
            entries: self.entries.iter(),
            predicate: criterion.compile_for(&self.shape)?,
            shape: &self.shape,
        })
    }

    /// Snapshot of the whole series as tuples
    pub fn entries_as_tuples(&self) -> Vec<Tuple> {
        self.entries
            .iter()
            .map(|entry| self.shape.tuple_from_entry(entry))
            .collect()
    }

    /// Insert each tuple in order, skipping the ones that fail validation
    pub fn import_many<'a>(&mut self, tuples: impl IntoIterator<Item = &'a Tuple>) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for tuple in tuples {
            match self.insert(tuple) {
                Ok(()) => summary.inserted += 1,
                Err(e) => {
                    tracing::warn!("Skipping {} during import: {}", tuple, e);
                    summary.skipped += 1;
                }
            }
        }
        summary
    }

    /// Import the list elements of a loosely-typed list; other elements are skipped
    pub fn import_from_list(&mut self, elements: &[RawElement]) -> ImportSummary {
        let tuples: Vec<Tuple> = elements.iter().filter_map(RawElement::as_tuple).collect();
        let mut summary = self.import_many(&tuples);
        summary.skipped += elements.len() - tuples.len();
        summary
    }

    /// Import rows zipped from parallel columns
    pub fn import_from_columns(&mut self, columns: &[Column], has_headers: bool) -> ImportSummary {
        let tuples = tuples_from_columns(columns, has_headers);
        self.import_many(&tuples)
    }

    /// Import a comma-separated element string, `arity` fields per tuple
    pub fn import_from_elements(&mut self, elements: &str) -> ImportSummary {
        let tuples = tuples_from_elements(elements, self.shape.arity());
        self.import_many(&tuples)
    }

    /// Remove every listed tuple, best-effort
    ///
    /// Non-list elements (scalars, symbolic markers) are skipped without
    /// error. Returns the number of entries removed.
    pub fn remove_values(&mut self, elements: &[RawElement]) -> usize {
        let mut removed = 0;
        for element in elements {
            match element.as_tuple() {
                Some(tuple) => {
                    if self.remove_by_tuple(&tuple) {
                        removed += 1;
                    }
                }
                None => tracing::debug!("Ignoring non-tuple element {:?} in removal list", element),
            }
        }
        removed
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.notify();
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer.on_data_changed();
        }
    }
}

/// Lazy, restartable sequence of tuples matching a criterion
pub struct Matches<'a, S: SeriesShape> {
    entries: std::collections::vec_deque::Iter<'a, Entry>,
    predicate: Predicate,
    shape: &'a S,
}

impl<S: SeriesShape> Clone for Matches<'_, S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            predicate: self.predicate.clone(),
            shape: self.shape,
        }
    }
}

impl<S: SeriesShape> Iterator for Matches<'_, S> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        let predicate = &self.predicate;
        self.entries
            .find(|entry| predicate.matches(entry))
            .map(|entry| self.shape.tuple_from_entry(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartDataError;
    use crate::model::entry::{CartesianShape, PieShape};
    use crate::model::observer::MockDataObserver;
    use crate::types::Value;
    use proptest::prelude::*;

    fn store() -> SeriesStore<CartesianShape> {
        SeriesStore::new(CartesianShape)
    }

    fn pair(x: f64, y: f64) -> Tuple {
        Tuple::pair(x, y)
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut s = store();
        s.insert(&pair(3.0, 1.0)).unwrap();
        s.insert(&pair(1.0, 2.0)).unwrap();
        assert_eq!(s.entries_as_tuples(), vec![pair(3.0, 1.0), pair(1.0, 2.0)]);
        assert_eq!(s.entry(0), Some(&Entry::Cartesian { x: 3.0, y: 1.0 }));
    }

    #[test]
    fn test_failed_insert_leaves_store_unchanged() {
        let mut observer = MockDataObserver::new();
        observer.expect_on_data_changed().times(1).return_const(());
        let mut s = store().with_observer(observer);

        s.insert(&pair(1.0, 1.0)).unwrap();
        let err = s.insert(&Tuple::pair("x", 1.0)).unwrap_err();
        assert!(matches!(err, ChartDataError::InvalidTupleShape(_)));
        assert!(s.insert_windowed(&Tuple::new([1.0])).is_err());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_windowed_insert_evicts_oldest() {
        let mut s = store();
        s.set_max_window(3);
        for i in 0..5 {
            s.insert_windowed(&pair(i as f64, 0.0)).unwrap();
        }
        assert_eq!(s.len(), 3);
        assert_eq!(
            s.entries_as_tuples(),
            vec![pair(2.0, 0.0), pair(3.0, 0.0), pair(4.0, 0.0)]
        );
    }

    #[test]
    fn test_window_shrink_trims_on_next_windowed_insert() {
        let mut s = store();
        for i in 0..10 {
            s.insert(&pair(i as f64, 0.0)).unwrap();
        }
        s.set_max_window(4);
        assert_eq!(s.len(), 10);
        s.insert_windowed(&pair(10.0, 0.0)).unwrap();
        assert_eq!(s.len(), 4);
        assert_eq!(s.entry(0), Some(&Entry::Cartesian { x: 7.0, y: 0.0 }));
    }

    #[test]
    fn test_max_window_defaults_and_clamps() {
        let mut s = store();
        assert_eq!(s.max_window(), DEFAULT_MAX_WINDOW);
        s.set_max_window(0);
        assert_eq!(s.max_window(), 1);
        let configured = SeriesStore::with_config(CartesianShape, &StoreSettings { max_window: 42 });
        assert_eq!(configured.max_window(), 42);
    }

    #[test]
    fn test_remove_by_tuple_removes_first_match_only() {
        let mut s = store();
        s.insert(&pair(1.0, 1.0)).unwrap();
        s.insert(&pair(2.0, 2.0)).unwrap();
        s.insert(&pair(1.0, 1.0)).unwrap();

        assert!(s.remove_by_tuple(&Tuple::pair("1", "1")));
        assert_eq!(s.entries_as_tuples(), vec![pair(2.0, 2.0), pair(1.0, 1.0)]);
        assert!(s.exists_by_tuple(&pair(1.0, 1.0)));
    }

    #[test]
    fn test_remove_missing_is_not_an_error() {
        let mut observer = MockDataObserver::new();
        observer.expect_on_data_changed().times(1).return_const(());
        let mut s = store().with_observer(observer);
        s.insert(&pair(1.0, 1.0)).unwrap();

        let before = s.entries_as_tuples();
        assert!(!s.remove_by_tuple(&pair(9.0, 9.0)));
        assert!(!s.remove_by_tuple(&Tuple::pair("bad", 1.0)));
        assert!(!s.exists_by_tuple(&pair(9.0, 9.0)));
        assert_eq!(s.entries_as_tuples(), before);
    }

    #[test]
    fn test_remove_at_validates_index() {
        let mut s = store();
        s.insert(&pair(1.0, 1.0)).unwrap();
        s.insert(&pair(2.0, 2.0)).unwrap();
        assert_eq!(s.remove_at(2), None);
        assert_eq!(s.len(), 2);
        assert_eq!(s.remove_at(0), Some(Entry::Cartesian { x: 1.0, y: 1.0 }));
        assert_eq!(s.entries_as_tuples(), vec![pair(2.0, 2.0)]);
    }

    #[test]
    fn test_find_by_x_in_insertion_order() {
        let mut s = store();
        s.insert(&pair(1.0, 10.0)).unwrap();
        s.insert(&pair(2.0, 20.0)).unwrap();
        s.insert(&pair(1.0, 30.0)).unwrap();

        let found: Vec<Tuple> = s.find(&Criterion::by_x("1")).unwrap().collect();
        assert_eq!(found, vec![pair(1.0, 10.0), pair(1.0, 30.0)]);
    }

    #[test]
    fn test_find_is_restartable() {
        let mut s = store();
        s.insert(&pair(1.0, 10.0)).unwrap();
        s.insert(&pair(2.0, 20.0)).unwrap();

        let mut matches = s.find(&Criterion::all()).unwrap();
        let restart = matches.clone();
        assert_eq!(matches.next(), Some(pair(1.0, 10.0)));
        assert_eq!(matches.count(), 1);
        assert_eq!(restart.count(), 2);
    }

    #[test]
    fn test_find_propagates_bad_literal() {
        let mut s = store();
        s.insert(&pair(1.0, 10.0)).unwrap();
        assert!(matches!(
            s.find(&Criterion::by_y("ten")),
            Err(ChartDataError::InvalidNumericLiteral(_))
        ));
    }

    #[test]
    fn test_find_by_label_on_pie_series() {
        let mut s = SeriesStore::new(PieShape);
        s.insert(&Tuple::pair("Apples", 3.0)).unwrap();
        s.insert(&Tuple::pair("Pears", 5.0)).unwrap();
        let found: Vec<Tuple> = s.find(&Criterion::by_label("Pears")).unwrap().collect();
        assert_eq!(found, vec![Tuple::pair("Pears", 5.0)]);
    }

    #[test]
    fn test_import_many_is_best_effort() {
        let mut s = store();
        let tuples = vec![pair(1.0, 1.0), Tuple::pair("nope", 2.0), pair(3.0, 3.0)];
        let summary = s.import_many(&tuples);
        assert_eq!(summary, ImportSummary { inserted: 2, skipped: 1 });
        assert_eq!(s.entries_as_tuples(), vec![pair(1.0, 1.0), pair(3.0, 3.0)]);
    }

    #[test]
    fn test_import_from_list_skips_non_tuples() {
        let mut s = store();
        let elements = vec![
            RawElement::Symbol("*list*".into()),
            RawElement::List(vec![Value::from(1.0), Value::from(2.0)]),
            RawElement::Scalar(Value::from(5.0)),
        ];
        let summary = s.import_from_list(&elements);
        assert_eq!(summary, ImportSummary { inserted: 1, skipped: 2 });
    }

    #[test]
    fn test_import_from_columns_and_elements() {
        let mut s = store();
        let columns = vec![
            Column::Values(vec!["x".into(), 1.0.into(), 2.0.into()]),
            Column::Values(vec!["y".into(), 10.0.into(), 20.0.into()]),
        ];
        s.import_from_columns(&columns, true);
        s.import_from_elements("3,30,4,40,5");
        assert_eq!(
            s.entries_as_tuples(),
            vec![pair(1.0, 10.0), pair(2.0, 20.0), pair(3.0, 30.0), pair(4.0, 40.0)]
        );
    }

    #[test]
    fn test_remove_values_skips_markers() {
        let mut s = store();
        s.import_from_elements("1,1,2,2,3,3");
        let removed = s.remove_values(&[
            RawElement::Symbol("*list*".into()),
            pair(2.0, 2.0).into(),
            pair(7.0, 7.0).into(),
        ]);
        assert_eq!(removed, 1);
        assert_eq!(s.entries_as_tuples(), vec![pair(1.0, 1.0), pair(3.0, 3.0)]);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut s = store();
        s.insert(&pair(1.0, 1.0)).unwrap();
        s.clear();
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.find(&Criterion::all()).unwrap().count(), 0);
    }

    #[test]
    fn test_observer_fires_once_per_mutation() {
        let mut observer = MockDataObserver::new();
        // insert, insert_windowed, remove_by_tuple, remove_at, clear
        observer.expect_on_data_changed().times(5).return_const(());
        let mut s = store().with_observer(observer);

        s.insert(&pair(1.0, 1.0)).unwrap();
        s.insert_windowed(&pair(2.0, 2.0)).unwrap();
        assert!(s.remove_by_tuple(&pair(1.0, 1.0)));
        assert!(s.remove_at(0).is_some());
        assert!(s.remove_at(0).is_none());
        s.clear();
    }

    proptest! {
        #[test]
        fn test_window_bound_holds(
            window in 1usize..20,
            xs in prop::collection::vec(-1000i32..1000, 0..100)
        ) {
            let mut s = store();
            s.set_max_window(window);
            for &x in &xs {
                s.insert_windowed(&pair(x as f64, 0.0)).unwrap();
                prop_assert!(s.len() <= window);
            }

            // Survivors are the most recent insertions, in order
            let start = xs.len().saturating_sub(window);
            let expected: Vec<Tuple> = xs[start..].iter().map(|&x| pair(x as f64, 0.0)).collect();
            prop_assert_eq!(s.entries_as_tuples(), expected);
        }

        #[test]
        fn test_removing_absent_tuple_is_idempotent(
            ys in prop::collection::vec(0i32..50, 0..30)
        ) {
            let mut s = store();
            for &y in &ys {
                s.insert(&pair(1.0, y as f64)).unwrap();
            }
            let before = s.entries_as_tuples();
            prop_assert!(!s.remove_by_tuple(&pair(1.0, 99.0)));
            prop_assert_eq!(s.entries_as_tuples(), before);
        }
    }
}
