//! Session-management rendezvous subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap (singleton.rs, owning thread):
//!     gethostname → bind UDP → O_ASYNC|O_NONBLOCK → F_SETOWN_EX(tid)
//!     → publish singleton → sigaction(SIGIO)
//!
//! Endpoint threads (registry.rs):
//!     Hook::new → Nexus::register_hook ... Nexus::unregister_hook
//!
//! Control datagram (dispatch.rs):
//!     SIGIO at owning thread → drain socket → route by thread id → sink
//! ```
//!
//! # Design Decisions
//! - Exactly one Nexus per process, in a write-once slot
//! - Invariant violations terminate the process
//! - Registry mutations are serialized by one mutex

pub mod dispatch;
pub mod error;
pub mod hook;
pub mod registry;
pub mod singleton;

pub use dispatch::{encode_datagram, ControlHeader, StatsSnapshot};
pub use error::{BootstrapError, RegistryError};
pub use hook::{AppTid, ControlSink, EventCounter, Hook};
pub use registry::HookRegistry;
pub use singleton::Nexus;
