//! OS-facing network layer.
//!
//! # Data Flow
//! ```text
//! Nexus bootstrap
//!     → identity.rs (hostname, kernel thread id)
//!     → socket.rs (bind, O_ASYNC|O_NONBLOCK, F_SETOWN_EX)
//!     → ControlSocket handed to the Nexus
//! ```
//!
//! # Design Decisions
//! - Thin wrappers over libc; every failure surfaces as `io::Error`
//! - Linux only: thread-targeted SIGIO needs `F_SETOWN_EX`

pub mod identity;
pub mod socket;

pub use identity::{local_hostname, native_tid, process_id};
pub use socket::{ControlSocket, SigioOwner};
