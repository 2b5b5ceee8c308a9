//! SIGIO-driven control datagram dispatch.
//!
//! # Data Flow
//! ```text
//! datagram arrives on control socket
//!     → kernel raises SIGIO at the owning thread only
//!     → sigio_handler (owning thread, interrupted context)
//!     → drain socket until EAGAIN
//!         → parse routing header → find hook by thread id → sink.deliver
//! ```
//!
//! # Design Decisions
//! - Handler does bounded, non-blocking work: no allocation, no logging
//! - Registry accessed with `try_lock`; contention defers to `tgkill` re-raise
//! - `errno` is saved and restored around the handler body
//! - Installed without `SA_NODEFER`, so SIGIO cannot re-enter it

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::net::socket::ControlSocket;
use crate::nexus::singleton::Nexus;
use crate::nexus::hook::{AppTid, Hook};

/// First byte of every control datagram.
pub const CONTROL_MAGIC: u8 = 0xE5;

/// Length of the routing header in bytes.
pub const HEADER_LEN: usize = 2;

/// Largest datagram read from the control socket.
pub const MAX_CONTROL_DATAGRAM: usize = 2048;

/// Routing prefix of a control datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlHeader {
    /// Thread id of the endpoint the datagram is for.
    pub dest: AppTid,
}

impl ControlHeader {
    /// Split `datagram` into its header and the opaque payload.
    pub fn parse(datagram: &[u8]) -> Option<(Self, &[u8])> {
        match datagram {
            [CONTROL_MAGIC, dest, payload @ ..] => Some((Self { dest: AppTid(*dest) }, payload)),
            _ => None,
        }
    }

    /// Header bytes.
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        [CONTROL_MAGIC, self.dest.0]
    }
}

/// Frame `payload` as a control datagram for `dest`.
pub fn encode_datagram(dest: AppTid, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&ControlHeader { dest }.to_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Counters updated from the handler.
#[derive(Debug, Default)]
pub struct DispatchStats {
    signals: AtomicU64,
    datagrams: AtomicU64,
    delivered: AtomicU64,
    malformed: AtomicU64,
    unroutable: AtomicU64,
    deferred: AtomicU64,
    recv_errors: AtomicU64,
}

/// Plain copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub signals: u64,
    pub datagrams: u64,
    pub delivered: u64,
    pub malformed: u64,
    pub unroutable: u64,
    pub deferred: u64,
    pub recv_errors: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            signals: self.signals.load(Ordering::Relaxed),
            datagrams: self.datagrams.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unroutable: self.unroutable.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// What happened to one datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Routed {
    Delivered,
    Malformed,
    Unroutable,
}

/// Hand one datagram to the hook it is addressed to.
pub(crate) fn route(hooks: &[Arc<Hook>], datagram: &[u8]) -> Routed {
    let Some((header, payload)) = ControlHeader::parse(datagram) else {
        return Routed::Malformed;
    };

    match hooks.iter().find(|h| h.app_tid() == header.dest) {
        Some(hook) => {
            hook.deliver(payload);
            Routed::Delivered
        }
        None => Routed::Unroutable,
    }
}

fn drain(socket: &ControlSocket, hooks: &[Arc<Hook>], stats: &DispatchStats) {
    let mut buf = [0u8; MAX_CONTROL_DATAGRAM];
    loop {
        let len = match socket.recv_from(&mut buf) {
            Ok((len, _)) => len,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => {
                DispatchStats::bump(&stats.recv_errors);
                break;
            }
        };
        DispatchStats::bump(&stats.datagrams);

        match route(hooks, &buf[..len]) {
            Routed::Delivered => DispatchStats::bump(&stats.delivered),
            Routed::Malformed => DispatchStats::bump(&stats.malformed),
            Routed::Unroutable => DispatchStats::bump(&stats.unroutable),
        }
    }
}

/// Drain the control socket. Runs on the owning thread.
///
/// The registry lock is held for the whole drain. If it is busy, nothing is
/// read: datagrams stay queued in the kernel until the holder re-raises SIGIO.
pub(crate) fn dispatch(nexus: &Nexus) {
    let stats = nexus.dispatch_stats();
    DispatchStats::bump(&stats.signals);

    let socket = nexus.control_socket();
    if nexus
        .registry()
        .try_with_hooks(|hooks| drain(socket, hooks, stats))
        .is_none()
    {
        DispatchStats::bump(&stats.deferred);
    }
}

extern "C" fn sigio_handler(_sig: libc::c_int) {
    // SAFETY: __errno_location returns this thread's errno slot.
    let saved_errno = unsafe { *libc::__errno_location() };

    if let Some(nexus) = Nexus::global() {
        dispatch(nexus);
    }

    // SAFETY: as above.
    unsafe { *libc::__errno_location() = saved_errno };
}

/// Install [`sigio_handler`] for SIGIO.
///
/// Blocking calls interrupted on the owning thread fail with `EINTR`.
pub(crate) fn install_sigio_handler() -> io::Result<()> {
    // SAFETY: all-zeroes is a valid sigaction; the handler is an extern "C"
    // fn with a stable address.
    unsafe {
        let mut act: libc::sigaction = std::mem::zeroed();
        act.sa_sigaction = sigio_handler as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::sigemptyset(&mut act.sa_mask);
        // Default semantics: no SA_NODEFER, so SIGIO stays blocked while the
        // handler runs, and no SA_RESTART.
        act.sa_flags = 0;
        if libc::sigaction(libc::SIGIO, &act, std::ptr::null_mut()) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Raise SIGIO at kernel thread `tid` of this process.
pub(crate) fn raise_sigio_at(tid: i32) -> io::Result<()> {
    // SAFETY: tgkill only targets threads of our own thread group.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_tgkill,
            libc::getpid() as libc::c_long,
            tid as libc::c_long,
            libc::SIGIO as libc::c_long,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
