//! Endpoint worker threads.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, Thread};

use crate::endpoint::Endpoint;
use crate::nexus::{AppTid, EventCounter, Nexus};

/// A named OS thread hosting one endpoint.
#[derive(Debug)]
pub struct Worker {
    app_tid: AppTid,
    stop: Arc<AtomicBool>,
    thread: Thread,
    handle: JoinHandle<u64>,
}

impl Worker {
    /// Start a worker whose endpoint registers as `app_tid`.
    pub fn spawn(nexus: &'static Nexus, app_tid: AppTid) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = stop.clone();

        let handle = thread::Builder::new()
            .name(format!("endpoint-{}", app_tid))
            .spawn(move || run(nexus, app_tid, worker_stop))?;

        Ok(Self {
            app_tid,
            stop,
            thread: handle.thread().clone(),
            handle,
        })
    }

    pub fn app_tid(&self) -> AppTid {
        self.app_tid
    }

    /// Stop the worker and wait for it. Returns the control events it saw.
    pub fn stop(self) -> thread::Result<u64> {
        self.stop.store(true, Ordering::SeqCst);
        self.thread.unpark();
        self.handle.join()
    }
}

fn run(nexus: &'static Nexus, app_tid: AppTid, stop: Arc<AtomicBool>) -> u64 {
    let counter = Arc::new(EventCounter::with_waiter(thread::current()));
    let endpoint = Endpoint::new(nexus, app_tid, counter.clone());
    tracing::info!(app_tid = %endpoint.app_tid(), "Endpoint started");

    let mut seen = 0;
    while !stop.load(Ordering::SeqCst) {
        let events = counter.events();
        if events > seen {
            tracing::info!(
                app_tid = %app_tid,
                new_events = events - seen,
                total_bytes = counter.bytes(),
                "Control events received"
            );
            seen = events;
        }
        thread::park();
    }

    drop(endpoint);
    let total = counter.events();
    tracing::info!(app_tid = %app_tid, events = total, "Endpoint stopped");
    total
}
