//! Endpoint side of the Nexus.
//!
//! # Data Flow
//! ```text
//! Worker thread starts
//!     → Endpoint::new (build Hook, register)
//!     → park until the sink unparks on a control event
//!     → Endpoint dropped (unregister) → thread exits
//! ```
//!
//! # Design Decisions
//! - Registration is tied to the Endpoint's lifetime (RAII)
//! - One endpoint per OS thread, one thread id per endpoint

pub mod worker;

use std::sync::Arc;

use crate::nexus::{AppTid, ControlSink, Hook, Nexus};

pub use worker::Worker;

/// An RPC endpoint's registration with the Nexus.
///
/// The hook is registered on construction and unregistered on drop.
#[derive(Debug)]
pub struct Endpoint {
    nexus: &'static Nexus,
    hook: Arc<Hook>,
}

impl Endpoint {
    /// Build a hook for `app_tid` and register it.
    pub fn new(nexus: &'static Nexus, app_tid: AppTid, sink: Arc<dyn ControlSink>) -> Self {
        let hook = Hook::new(app_tid, sink);
        nexus.register_hook(&hook);
        Self { nexus, hook }
    }

    /// Thread id this endpoint is reachable under.
    pub fn app_tid(&self) -> AppTid {
        self.hook.app_tid()
    }

    /// The registered hook.
    pub fn hook(&self) -> &Arc<Hook> {
        &self.hook
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.nexus.unregister_hook(&self.hook);
    }
}
