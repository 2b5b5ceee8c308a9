//! Shutdown coordination.

use tokio::sync::broadcast;

use crate::endpoint::Worker;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Stop every worker, unregistering its hook. Returns total control events seen.
pub fn stop_workers(workers: Vec<Worker>) -> u64 {
    let mut total = 0;
    for worker in workers {
        let app_tid = worker.app_tid();
        match worker.stop() {
            Ok(events) => total += events,
            Err(_) => tracing::error!(app_tid = %app_tid, "Endpoint thread panicked"),
        }
    }
    total
}
