//! The hub: shared, long-lived state owned by the listener and handed to
//! every session by reference. Mirrors the teacher's `SharedState` — one
//! value, no process-global statics, passed down as an `Arc`.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::HubConfig;
use crate::registry::Registry;

pub struct Hub {
    pub config: HubConfig,
    pub registry: Registry,
    shutdown: broadcast::Sender<()>,
}

impl Hub {
    pub fn new(config: HubConfig) -> Arc<Self> {
        let (shutdown, _) = broadcast::channel(1);
        Arc::new(Self { config, registry: Registry::new(), shutdown })
    }

    /// Subscribe to the shutdown signal. Every session holds one of these
    /// and selects on it alongside its socket read.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Signal every session to begin teardown. Best-effort: sessions that
    /// have already exited simply have no receiver left to notice.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }
}
