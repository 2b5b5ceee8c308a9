//! Nexus error definitions.
//!
//! None of these reach callers of the public Nexus operations: they describe
//! why the process is about to terminate.

use std::io;

use thiserror::Error;

use crate::nexus::hook::AppTid;

/// Failures while bringing up the control channel.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// `gethostname` failed.
    #[error("gethostname failed: {0}")]
    Hostname(io::Error),

    /// Socket creation or bind failed.
    #[error("error binding datagram socket on port {port}: {source}")]
    Bind { port: u16, source: io::Error },

    /// Setting `O_ASYNC | O_NONBLOCK` failed.
    #[error("fcntl F_SETFL O_ASYNC|O_NONBLOCK failed: {0}")]
    AsyncFlags(io::Error),

    /// Pinning SIGIO delivery to the constructing thread failed.
    #[error("fcntl F_SETOWN_EX to thread {tid} failed: {source}")]
    Owner { tid: i32, source: io::Error },

    /// Installing the SIGIO handler failed.
    #[error("sigaction(SIGIO) failed: {0}")]
    Handler(io::Error),

    /// A Nexus already exists in this process.
    #[error("a Nexus already exists in this process (port {existing_port})")]
    AlreadyConstructed { existing_port: u16 },
}

/// Registry invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same hook instance is already registered.
    #[error("attempt to re-register hook {hook:#x} (thread ID {tid})")]
    AlreadyRegistered { hook: usize, tid: AppTid },

    /// Another registered hook owns this thread id.
    #[error("attempt to register hook with existing thread ID {0}")]
    DuplicateThreadId(AppTid),

    /// The hook is not in the registry.
    #[error("attempt to unregister non-existent hook {hook:#x} (thread ID {tid})")]
    NotRegistered { hook: usize, tid: AppTid },
}
