//! Session-management rendezvous for a low-latency RPC framework.
//!
//! One [`Nexus`] per process owns the control-plane UDP socket. Endpoint
//! threads register [`nexus::Hook`]s with it; control datagrams raise SIGIO at
//! the thread that built the Nexus, which routes them to the matching hook.

#[cfg(not(target_os = "linux"))]
compile_error!("rpc-nexus requires Linux: thread-targeted SIGIO needs F_SETOWN_EX");

// Core subsystem
pub mod net;
pub mod nexus;
pub mod endpoint;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::NexusConfig;
pub use endpoint::{Endpoint, Worker};
pub use lifecycle::Shutdown;
pub use nexus::Nexus;
