//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nexus_signals_total` (counter): SIGIO deliveries handled
//! - `nexus_datagrams_total` (counter): control datagrams read
//! - `nexus_delivered_total` (counter): datagrams handed to a hook
//! - `nexus_malformed_total` (counter): datagrams without a valid header
//! - `nexus_unroutable_total` (counter): datagrams for unregistered threads
//! - `nexus_deferred_total` (counter): dispatches postponed by lock contention
//! - `nexus_recv_errors_total` (counter): receive failures
//! - `nexus_registered_hooks` (gauge): current registry size
//!
//! # Design Decisions
//! - Updated from snapshots outside the handler
//! - Counters are set absolutely from the handler's own totals

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::nexus::StatsSnapshot;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Publish a dispatch snapshot and the current registry size.
pub fn record_dispatch(stats: &StatsSnapshot, registered_hooks: usize) {
    counter!("nexus_signals_total").absolute(stats.signals);
    counter!("nexus_datagrams_total").absolute(stats.datagrams);
    counter!("nexus_delivered_total").absolute(stats.delivered);
    counter!("nexus_malformed_total").absolute(stats.malformed);
    counter!("nexus_unroutable_total").absolute(stats.unroutable);
    counter!("nexus_deferred_total").absolute(stats.deferred);
    counter!("nexus_recv_errors_total").absolute(stats.recv_errors);
    gauge!("nexus_registered_hooks").set(registered_hooks as f64);
}
