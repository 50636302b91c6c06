//! Observer and bridge construction helpers

use chartdata_rs::config::BridgeSettings;
use chartdata_rs::{SeriesShape, SeriesStore, StoreHandle, StoreWorker};
use crossbeam_channel::{unbounded, Receiver};
use std::thread::JoinHandle;

/// Observer that reports each change notification on a channel
///
/// The receiver yields one `()` per notification, in firing order.
pub fn channel_observer() -> (impl Fn() + Send + 'static, Receiver<()>) {
    let (tx, rx) = unbounded();
    let observer = move || {
        let _ = tx.send(());
    };
    (observer, rx)
}

/// Bridge settings with a small channel for tests
pub fn test_bridge_settings() -> BridgeSettings {
    BridgeSettings {
        query_timeout_ms: 2000,
        command_capacity: 16,
    }
}

/// Bridge settings whose queries give up after [`super::test_timeout`]
pub fn short_timeout_settings() -> BridgeSettings {
    BridgeSettings {
        query_timeout_ms: super::test_timeout().as_millis() as u64,
        command_capacity: 16,
    }
}

/// Spawn a worker thread owning `store`
pub fn spawn_test_worker<S>(store: SeriesStore<S>) -> (StoreHandle<S>, JoinHandle<SeriesStore<S>>)
where
    S: SeriesShape + Clone + Send + 'static,
{
    StoreWorker::spawn(store, &test_bridge_settings()).unwrap()
}
