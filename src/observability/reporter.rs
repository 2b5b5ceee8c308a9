//! Periodic dispatch statistics report.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::nexus::{Nexus, StatsSnapshot};
use crate::observability::metrics;

/// Logs and publishes Nexus statistics on an interval.
pub struct StatsReporter {
    nexus: &'static Nexus,
    interval: Duration,
    last: StatsSnapshot,
}

impl StatsReporter {
    pub fn new(nexus: &'static Nexus, interval: Duration) -> Self {
        Self {
            nexus,
            interval,
            last: StatsSnapshot::default(),
        }
    }

    /// Report until `shutdown` fires, then report once more.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.report(),
                _ = shutdown.recv() => {
                    tracing::debug!("Stats reporter received shutdown signal");
                    break;
                }
            }
        }

        self.report();
    }

    fn report(&mut self) {
        let stats = self.nexus.stats();
        let hooks = self.nexus.num_hooks();
        metrics::record_dispatch(&stats, hooks);

        if stats == self.last {
            tracing::trace!(registered_hooks = hooks, "No control traffic since last report");
            return;
        }

        tracing::info!(
            registered_hooks = hooks,
            signals = stats.signals,
            datagrams = stats.datagrams,
            delivered = stats.delivered,
            malformed = stats.malformed,
            unroutable = stats.unroutable,
            deferred = stats.deferred,
            recv_errors = stats.recv_errors,
            "Nexus dispatch statistics"
        );
        self.last = stats;
    }
}
