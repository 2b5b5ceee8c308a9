//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The Nexus is constructed on the calling thread, which must not migrate
//! - Workers start last, once the Nexus can route to them

use crate::config::NexusConfig;
use crate::endpoint::Worker;
use crate::lifecycle::fatal::OrFatal;
use crate::nexus::{AppTid, Nexus};

/// Everything started by [`start`].
pub struct Started {
    pub nexus: &'static Nexus,
    pub workers: Vec<Worker>,
}

/// Thread ids assigned to the configured workers.
pub fn worker_tids(config: &NexusConfig) -> impl Iterator<Item = AppTid> {
    let first = config.workers.first_tid as usize;
    (first..first + config.workers.count).map(|tid| AppTid(tid as u8))
}

/// Construct the Nexus on this thread and spawn the endpoint workers.
pub fn start(config: &NexusConfig) -> Started {
    let nexus = Nexus::new(config.nexus.udp_port);

    let workers = worker_tids(config)
        .map(|tid| Worker::spawn(nexus, tid).or_fatal("failed to spawn endpoint thread"))
        .collect::<Vec<_>>();

    tracing::info!(
        udp_port = nexus.udp_port(),
        hostname = nexus.hostname(),
        workers = workers.len(),
        "Nexus started"
    );

    Started { nexus, workers }
}
