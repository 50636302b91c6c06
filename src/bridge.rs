//! Cross-context access to a series store
//!
//! A [`SeriesStore`] belongs to one owning context (typically the thread that
//! drives rendering). Other threads reach it through a [`StoreHandle`], which
//! forwards mutations and queries over a crossbeam channel to the
//! [`StoreWorker`] running on the owning thread.
//!
//! # Ordering
//!
//! All commands travel through a single FIFO channel and the worker applies
//! them one at a time, so mutations (and the change notifications they fire)
//! happen in the order they were issued. A query sent after a mutation
//! observes that mutation.
//!
//! # Blocking queries
//!
//! Queries block the caller until the worker replies, bounded by
//! [`BridgeSettings::query_timeout`]. They fail with
//! [`ChartDataError::OwningContext`] when issued from the worker's own
//! thread (for example from inside an observer callback), which would
//! otherwise wait on itself.
//!
//! # Example
//!
//! ```ignore
//! let store = SeriesStore::new(CartesianShape);
//! let (handle, join) = StoreWorker::spawn(store, &BridgeSettings::default())?;
//!
//! handle.insert(&Tuple::pair(1.0, 10.0))?;
//! assert!(handle.exists_by_tuple(&Tuple::pair("1", "10"))?);
//!
//! handle.shutdown()?;
//! let store = join.join().unwrap();
//! ```

use crate::config::BridgeSettings;
use crate::error::{ChartDataError, Result};
use crate::model::{Criterion, Entry, SeriesShape, SeriesStore};
use crate::types::Tuple;
use crossbeam_channel::{
    bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

/// Read-only request answered on the owning context
///
/// Each variant carries the sender its answer goes back on.
#[derive(Debug)]
pub enum StoreQuery {
    /// Whether an entry equal to the tuple is stored
    Exists(Tuple, Sender<bool>),
    /// Tuples of all entries matching the criterion
    Find(Criterion, Sender<Result<Vec<Tuple>>>),
    /// Number of entries
    Count(Sender<usize>),
    /// All entries in draw order
    Snapshot(Sender<Vec<Entry>>),
}

/// Commands sent to the owning context
#[derive(Debug)]
pub enum StoreCommand {
    /// Append an entry already validated by the handle
    Insert(Entry),
    /// Append an entry, evicting the oldest to stay within the window
    InsertWindowed(Entry),
    /// Remove the first entry equal to the tuple
    RemoveByTuple(Tuple),
    /// Remove the first entry equal to the tuple and reply whether one was removed
    RemoveByTupleConfirmed(Tuple, Sender<bool>),
    /// Remove all entries
    Clear,
    /// Change the window size
    SetMaxWindow(usize),
    /// Answer a query
    Query(StoreQuery),
    /// Stop the worker loop
    Shutdown,
}

/// Owns a [`SeriesStore`] and applies commands to it
pub struct StoreWorker<S: SeriesShape> {
    store: SeriesStore<S>,
    command_rx: Receiver<StoreCommand>,
    running: Arc<AtomicBool>,
    owner: Arc<OnceLock<ThreadId>>,
}

impl<S: SeriesShape + Clone> StoreWorker<S> {
    /// Create a worker and a handle connected to it
    ///
    /// The worker does nothing until [`StoreWorker::run`] is called on the
    /// thread that should own the store.
    pub fn new(store: SeriesStore<S>, settings: &BridgeSettings) -> (Self, StoreHandle<S>) {
        let (command_tx, command_rx) = bounded(settings.command_capacity.max(1));
        let running = Arc::new(AtomicBool::new(true));
        let owner = Arc::new(OnceLock::new());

        let handle = StoreHandle {
            shape: store.shape().clone(),
            command_tx,
            running: running.clone(),
            owner: owner.clone(),
            timeout: settings.query_timeout(),
        };
        let worker = Self {
            store,
            command_rx,
            running,
            owner,
        };
        (worker, handle)
    }
}

impl<S> StoreWorker<S>
where
    S: SeriesShape + Clone + Send + 'static,
{
    /// Move `store` onto a dedicated thread and return a handle to it
    ///
    /// Joining the returned thread yields the store once the worker stops.
    pub fn spawn(
        store: SeriesStore<S>,
        settings: &BridgeSettings,
    ) -> Result<(StoreHandle<S>, JoinHandle<SeriesStore<S>>)> {
        let (mut worker, handle) = Self::new(store, settings);
        let join = thread::Builder::new()
            .name("series-store".to_string())
            .spawn(move || {
                worker.run();
                worker.into_store()
            })?;
        Ok((handle, join))
    }
}

impl<S: SeriesShape> StoreWorker<S> {
    /// Process commands on the current thread until shutdown
    ///
    /// The calling thread becomes the owning context. Returns when a
    /// [`StoreCommand::Shutdown`] arrives or every handle is dropped.
    pub fn run(&mut self) {
        let _ = self.owner.set(thread::current().id());
        tracing::info!("Store worker started ({} series)", self.store.shape().name());

        while self.running.load(Ordering::SeqCst) {
            match self.command_rx.recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(_) => {
                    // All handles dropped
                    self.running.store(false, Ordering::SeqCst);
                }
            }
        }

        tracing::info!("Store worker stopped");
    }

    /// Apply any commands already queued without blocking
    ///
    /// Like [`StoreWorker::run`], this makes the calling thread the owning
    /// context.
    pub fn process_pending(&mut self) {
        let _ = self.owner.set(thread::current().id());
        while let Ok(cmd) = self.command_rx.try_recv() {
            self.handle_command(cmd);
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: StoreCommand) {
        match cmd {
            StoreCommand::Insert(entry) => {
                self.store.insert_entry(entry);
            }
            StoreCommand::InsertWindowed(entry) => {
                self.store.insert_entry_windowed(entry);
            }
            StoreCommand::RemoveByTuple(tuple) => {
                if !self.store.remove_by_tuple(&tuple) {
                    tracing::debug!("Remove of {} matched nothing", tuple);
                }
            }
            StoreCommand::RemoveByTupleConfirmed(tuple, reply) => {
                let _ = reply.send(self.store.remove_by_tuple(&tuple));
            }
            StoreCommand::Clear => {
                self.store.clear();
            }
            StoreCommand::SetMaxWindow(max_window) => {
                self.store.set_max_window(max_window);
            }
            StoreCommand::Query(query) => {
                self.answer(query);
            }
            StoreCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    fn answer(&self, query: StoreQuery) {
        // A send error means the caller timed out and went away
        match query {
            StoreQuery::Exists(tuple, reply) => {
                let _ = reply.send(self.store.exists_by_tuple(&tuple));
            }
            StoreQuery::Find(criterion, reply) => {
                let found = self
                    .store
                    .find(&criterion)
                    .map(|matches| matches.collect());
                let _ = reply.send(found);
            }
            StoreQuery::Count(reply) => {
                let _ = reply.send(self.store.len());
            }
            StoreQuery::Snapshot(reply) => {
                let _ = reply.send(self.store.entries().cloned().collect());
            }
        }
    }

    /// Whether the worker is still accepting commands
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The store this worker owns
    pub fn store(&self) -> &SeriesStore<S> {
        &self.store
    }

    /// Give back the store
    pub fn into_store(self) -> SeriesStore<S> {
        self.store
    }
}

/// Cloneable handle for reaching a store from any thread
#[derive(Debug, Clone)]
pub struct StoreHandle<S: SeriesShape> {
    shape: S,
    command_tx: Sender<StoreCommand>,
    running: Arc<AtomicBool>,
    owner: Arc<OnceLock<ThreadId>>,
    timeout: Duration,
}

impl<S: SeriesShape> StoreHandle<S> {
    /// Whether the worker is still accepting commands
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Timeout applied to queries and to sends on a full channel
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the calling thread is the store's owning context
    pub fn is_owning_context(&self) -> bool {
        self.owner.get() == Some(&thread::current().id())
    }

    fn send(&self, cmd: StoreCommand) -> Result<()> {
        self.command_tx
            .send_timeout(cmd, self.timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => ChartDataError::BridgeTimeout(self.timeout),
                SendTimeoutError::Disconnected(_) => ChartDataError::BridgeDisconnected,
            })
    }

    fn request<T>(&self, query: impl FnOnce(Sender<T>) -> StoreQuery) -> Result<T> {
        self.round_trip(|reply| StoreCommand::Query(query(reply)))
    }

    /// Send a command carrying a reply sender and wait for the answer
    fn round_trip<T>(&self, command: impl FnOnce(Sender<T>) -> StoreCommand) -> Result<T> {
        if self.is_owning_context() {
            return Err(ChartDataError::OwningContext);
        }

        let (reply_tx, reply_rx) = bounded(1);
        self.send(command(reply_tx))?;

        match reply_rx.recv_timeout(self.timeout) {
            Ok(reply) => Ok(reply),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!("Store query timed out after {:?}", self.timeout);
                Err(ChartDataError::BridgeTimeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ChartDataError::BridgeDisconnected),
        }
    }

    // --- Mutations ---

    /// Validate `tuple` here and append it on the owning context
    pub fn insert(&self, tuple: &Tuple) -> Result<()> {
        let entry = self.shape.entry_from_tuple(tuple)?;
        self.send(StoreCommand::Insert(entry))
    }

    /// Validate `tuple` here and append it in windowed mode on the owning context
    pub fn insert_windowed(&self, tuple: &Tuple) -> Result<()> {
        let entry = self.shape.entry_from_tuple(tuple)?;
        self.send(StoreCommand::InsertWindowed(entry))
    }

    /// Queue removal of the first entry equal to `tuple` without waiting
    ///
    /// Whether anything matched is not reported; use
    /// [`StoreHandle::remove_by_tuple_confirmed`] for that.
    pub fn remove_by_tuple(&self, tuple: &Tuple) -> Result<()> {
        self.send(StoreCommand::RemoveByTuple(tuple.clone()))
    }

    /// Remove the first entry equal to `tuple`, waiting for the outcome
    ///
    /// Returns false when nothing matched. Blocks like a query, so it fails
    /// with [`ChartDataError::OwningContext`] on the owning thread.
    pub fn remove_by_tuple_confirmed(&self, tuple: &Tuple) -> Result<bool> {
        let tuple = tuple.clone();
        self.round_trip(|reply| StoreCommand::RemoveByTupleConfirmed(tuple, reply))
    }

    pub fn clear(&self) -> Result<()> {
        self.send(StoreCommand::Clear)
    }

    pub fn set_max_window(&self, max_window: usize) -> Result<()> {
        self.send(StoreCommand::SetMaxWindow(max_window))
    }

    /// Ask the worker to stop after the commands already queued
    pub fn shutdown(&self) -> Result<()> {
        self.send(StoreCommand::Shutdown)
    }

    // --- Queries ---

    /// Whether an entry equal to `tuple` is stored
    pub fn exists_by_tuple(&self, tuple: &Tuple) -> Result<bool> {
        let tuple = tuple.clone();
        self.request(|reply| StoreQuery::Exists(tuple, reply))
    }

    /// Tuples of all entries matching `criterion`, in draw order
    pub fn find(&self, criterion: &Criterion) -> Result<Vec<Tuple>> {
        // Malformed literals fail here without a round trip
        criterion.compile_for(&self.shape)?;
        let criterion = criterion.clone();
        self.request(|reply| StoreQuery::Find(criterion, reply))?
    }

    /// Number of stored entries
    pub fn count(&self) -> Result<usize> {
        self.request(StoreQuery::Count)
    }

    /// All entries in draw order
    pub fn snapshot(&self) -> Result<Vec<Entry>> {
        self.request(StoreQuery::Snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CartesianShape, PieShape};

    fn settings(timeout_ms: u64) -> BridgeSettings {
        BridgeSettings {
            query_timeout_ms: timeout_ms,
            ..Default::default()
        }
    }

    #[test]
    fn test_commands_applied_in_order() {
        let (mut worker, handle) = StoreWorker::new(SeriesStore::new(CartesianShape), &settings(100));

        handle.insert(&Tuple::pair(1.0, 1.0)).unwrap();
        handle.insert(&Tuple::pair(2.0, 2.0)).unwrap();
        handle.remove_by_tuple(&Tuple::pair(1.0, 1.0)).unwrap();
        handle.insert(&Tuple::pair(3.0, 3.0)).unwrap();
        worker.process_pending();

        assert_eq!(
            worker.store().entries_as_tuples(),
            vec![Tuple::pair(2.0, 2.0), Tuple::pair(3.0, 3.0)]
        );
    }

    #[test]
    fn test_invalid_tuple_rejected_before_send() {
        let (mut worker, handle) = StoreWorker::new(SeriesStore::new(CartesianShape), &settings(100));

        let err = handle.insert(&Tuple::pair("a", 1.0)).unwrap_err();
        assert!(matches!(err, ChartDataError::InvalidTupleShape(_)));
        worker.process_pending();
        assert!(worker.store().is_empty());
    }

    #[test]
    fn test_window_commands() {
        let (mut worker, handle) = StoreWorker::new(SeriesStore::new(CartesianShape), &settings(100));

        handle.set_max_window(2).unwrap();
        for i in 0..5 {
            handle.insert_windowed(&Tuple::pair(i as f64, 0.0)).unwrap();
        }
        worker.process_pending();
        assert_eq!(worker.store().max_window(), 2);
        assert_eq!(worker.store().len(), 2);

        handle.clear().unwrap();
        worker.process_pending();
        assert!(worker.store().is_empty());
    }

    #[test]
    fn test_query_without_running_worker_times_out() {
        let (_worker, handle) = StoreWorker::new(SeriesStore::new(CartesianShape), &settings(20));

        let err = handle.count().unwrap_err();
        assert!(matches!(err, ChartDataError::BridgeTimeout(d) if d == Duration::from_millis(20)));
    }

    #[test]
    fn test_dropped_worker_disconnects() {
        let (worker, handle) = StoreWorker::new(SeriesStore::new(CartesianShape), &settings(100));
        drop(worker);

        assert!(matches!(handle.count(), Err(ChartDataError::BridgeDisconnected)));
        assert!(matches!(
            handle.insert(&Tuple::pair(1.0, 1.0)),
            Err(ChartDataError::BridgeDisconnected)
        ));
    }

    #[test]
    fn test_queries_from_another_thread() {
        let mut store = SeriesStore::new(PieShape);
        store.insert(&Tuple::pair("Apples", 3.0)).unwrap();
        let (handle, join) = StoreWorker::spawn(store, &settings(1000)).unwrap();

        assert!(handle.exists_by_tuple(&Tuple::pair("Apples", "3")).unwrap());
        assert!(!handle.exists_by_tuple(&Tuple::pair("Pears", 3.0)).unwrap());
        assert_eq!(
            handle.find(&Criterion::by_label("Apples")).unwrap(),
            vec![Tuple::pair("Apples", 3.0)]
        );
        assert_eq!(handle.count().unwrap(), 1);

        handle.shutdown().unwrap();
        let store = join.join().unwrap();
        assert_eq!(store.len(), 1);
        assert!(!handle.is_running());
    }

    #[test]
    fn test_find_rejects_bad_literal_locally() {
        let (_worker, handle) = StoreWorker::new(SeriesStore::new(CartesianShape), &settings(20));

        // No worker is running, so reaching the channel would time out instead
        assert!(matches!(
            handle.find(&Criterion::by_x("one")),
            Err(ChartDataError::InvalidNumericLiteral(_))
        ));
    }

    #[test]
    fn test_query_from_owning_context_fails_fast() {
        let (reply_tx, reply_rx) = bounded(1);
        let (mut worker, handle) = StoreWorker::new(SeriesStore::new(CartesianShape), &settings(5000));

        let observer_handle = handle.clone();
        worker.store.set_observer(Some(Box::new(move || {
            let _ = reply_tx.try_send(observer_handle.exists_by_tuple(&Tuple::pair(1.0, 1.0)));
        })));

        let join = thread::spawn(move || worker.run());
        handle.insert(&Tuple::pair(1.0, 1.0)).unwrap();

        let result = reply_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(result, Err(ChartDataError::OwningContext)));

        handle.shutdown().unwrap();
        join.join().unwrap();
    }

    #[test]
    fn test_process_pending_claims_owning_context() {
        let (reply_tx, reply_rx) = bounded(1);
        let (mut worker, handle) = StoreWorker::new(SeriesStore::new(CartesianShape), &settings(5000));

        let observer_handle = handle.clone();
        worker.store.set_observer(Some(Box::new(move || {
            let _ = reply_tx.try_send(observer_handle.exists_by_tuple(&Tuple::pair(1.0, 1.0)));
        })));

        // Driven cooperatively from this thread, no dedicated worker thread
        handle.insert(&Tuple::pair(1.0, 1.0)).unwrap();
        let started = std::time::Instant::now();
        worker.process_pending();

        let result = reply_rx.try_recv().unwrap();
        assert!(matches!(result, Err(ChartDataError::OwningContext)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(handle.is_owning_context());
        assert!(matches!(handle.count(), Err(ChartDataError::OwningContext)));
    }

    #[test]
    fn test_confirmed_removal_reports_match() {
        let mut store = SeriesStore::new(CartesianShape);
        store.insert(&Tuple::pair(1.0, 1.0)).unwrap();
        let (handle, join) = StoreWorker::spawn(store, &settings(1000)).unwrap();

        assert!(handle.remove_by_tuple_confirmed(&Tuple::pair("1", "1.0")).unwrap());
        assert!(!handle.remove_by_tuple_confirmed(&Tuple::pair(1.0, 1.0)).unwrap());
        assert_eq!(handle.count().unwrap(), 0);

        handle.shutdown().unwrap();
        join.join().unwrap();
    }

    #[test]
    fn test_find_by_x_on_pie_through_handle() {
        let mut store = SeriesStore::new(PieShape);
        store.insert(&Tuple::pair("Apples", 3.0)).unwrap();
        let (handle, join) = StoreWorker::spawn(store, &settings(1000)).unwrap();

        assert_eq!(
            handle.find(&Criterion::by_x("Apples")).unwrap(),
            vec![Tuple::pair("Apples", 3.0)]
        );
        assert!(handle.find(&Criterion::by_x("Pears")).unwrap().is_empty());

        handle.shutdown().unwrap();
        join.join().unwrap();
    }
}
