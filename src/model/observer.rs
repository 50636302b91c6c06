//! "Data changed" notification towards the rendering layer

#[cfg(test)]
use mockall::automock;

/// Receiver of change notifications from a [`SeriesStore`](crate::model::SeriesStore)
///
/// Fired once after every successful mutation, in the order the mutations
/// were applied. It carries no payload; the renderer re-reads the entries.
#[cfg_attr(test, automock)]
pub trait DataObserver: Send {
    fn on_data_changed(&self);
}

impl<F> DataObserver for F
where
    F: Fn() + Send,
{
    fn on_data_changed(&self) {
        self()
    }
}
