//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Construct Nexus on this thread → Spawn workers
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop background tasks → Stop workers (unregister) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGIO → owned by the Nexus, never handled here
//!
//! Fatal (fatal.rs):
//!     Bootstrap failure / registry invariant violation → stderr → exit(1)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: Nexus first, then the endpoints that register with it
//! - The Nexus itself has no teardown; process exit releases the socket

pub mod fatal;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use fatal::{fatal, OrFatal};
pub use shutdown::Shutdown;
