//! Session-management hooks.
//!
//! # Responsibilities
//! - Identify an endpoint thread as reachable for control events
//! - Carry the sink dispatch hands matching datagrams to
//!
//! # Design Decisions
//! - Hook identity is its `Arc` allocation, not its contents
//! - Sinks run inside the SIGIO handler and must be async-signal-safe

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::Thread;

/// Application-level thread identifier of an RPC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppTid(pub u8);

impl From<u8> for AppTid {
    fn from(tid: u8) -> Self {
        Self(tid)
    }
}

impl From<AppTid> for u8 {
    fn from(tid: AppTid) -> Self {
        tid.0
    }
}

impl std::fmt::Display for AppTid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiver of control datagrams routed to one endpoint.
///
/// **Contract:** `deliver` is called from the SIGIO handler on the Nexus
/// owning thread. It must not allocate, take blocking locks, log, or block.
/// The slice is only valid for the duration of the call.
pub trait ControlSink: Send + Sync {
    /// Accept one control payload (routing header already stripped).
    fn deliver(&self, payload: &[u8]);
}

/// Sink that counts events in atomics and optionally wakes a parked thread.
#[derive(Debug, Default)]
pub struct EventCounter {
    events: AtomicU64,
    bytes: AtomicU64,
    waiter: Option<Thread>,
}

impl EventCounter {
    /// Create a counter with no waiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counter that unparks `waiter` on every delivery.
    pub fn with_waiter(waiter: Thread) -> Self {
        Self {
            waiter: Some(waiter),
            ..Self::default()
        }
    }

    /// Total events delivered.
    pub fn events(&self) -> u64 {
        self.events.load(Ordering::Acquire)
    }

    /// Total payload bytes delivered.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Acquire)
    }
}

impl ControlSink for EventCounter {
    fn deliver(&self, payload: &[u8]) {
        self.bytes.fetch_add(payload.len() as u64, Ordering::Relaxed);
        self.events.fetch_add(1, Ordering::Release);
        // unpark is an atomic swap plus a futex wake
        if let Some(waiter) = &self.waiter {
            waiter.unpark();
        }
    }
}

/// Registration record of one endpoint.
pub struct Hook {
    app_tid: AppTid,
    sink: Arc<dyn ControlSink>,
}

impl Hook {
    /// Create a hook for the endpoint running as `app_tid`.
    pub fn new(app_tid: AppTid, sink: Arc<dyn ControlSink>) -> Arc<Self> {
        Arc::new(Self { app_tid, sink })
    }

    /// Owning application thread id.
    pub fn app_tid(&self) -> AppTid {
        self.app_tid
    }

    /// Address of this hook, used in diagnostics.
    pub fn addr(self: &Arc<Self>) -> usize {
        Arc::as_ptr(self) as *const () as usize
    }

    pub(crate) fn deliver(&self, payload: &[u8]) {
        self.sink.deliver(payload);
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook").field("app_tid", &self.app_tid).finish()
    }
}
