use tokio::sync::broadcast;

use crate::config::DispatchSettings;
use crate::models::dispatch_log::DispatchLogEntry;
use crate::observability::metrics::Metrics;
use crate::store::Store;

pub struct AppState {
    pub store: Store,
    pub settings: DispatchSettings,
    pub dispatch_events_tx: broadcast::Sender<DispatchLogEntry>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(settings: DispatchSettings, event_buffer_size: usize) -> Self {
        let (dispatch_events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));

        Self {
            store: Store::new(),
            settings,
            dispatch_events_tx,
            metrics: Metrics::new(),
        }
    }

    /// Fans a committed log entry out to live subscribers. Having none is fine.
    pub fn publish(&self, entry: &DispatchLogEntry) {
        let _ = self.dispatch_events_tx.send(entry.clone());
    }
}
