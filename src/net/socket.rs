//! Control-plane UDP socket.
//!
//! # Responsibilities
//! - Bind the wildcard address on the control port
//! - Enable `O_ASYNC | O_NONBLOCK` so readability raises SIGIO
//! - Pin SIGIO delivery to one kernel thread (`F_SETOWN_EX`)
//!
//! # Design Decisions
//! - No `SO_REUSEADDR`: a second bind on a live port must fail
//! - The socket is never closed explicitly; it lives as long as the process

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::os::fd::{AsRawFd, RawFd};

// From <fcntl.h>. Declared here so we only depend on the stable ABI values.
const F_SETOWN_EX: libc::c_int = 15;
const F_GETOWN_EX: libc::c_int = 16;
const F_OWNER_TID: libc::c_int = 0;
const F_OWNER_PID: libc::c_int = 1;
const F_OWNER_PGRP: libc::c_int = 2;

#[repr(C)]
struct FOwnerEx {
    kind: libc::c_int,
    pid: libc::pid_t,
}

/// Who receives SIGIO for a file descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigioOwner {
    /// A single kernel thread.
    Thread(i32),
    /// Any thread of a process.
    Process(i32),
    /// A process group.
    ProcessGroup(i32),
    /// No owner set.
    None,
}

/// The bound, asynchronous control socket.
#[derive(Debug)]
pub struct ControlSocket {
    inner: UdpSocket,
}

impl ControlSocket {
    /// Bind a UDP socket to `0.0.0.0:port`.
    pub fn bind(port: u16) -> io::Result<Self> {
        let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        let inner = UdpSocket::bind(addr)?;
        Ok(Self { inner })
    }

    /// Set `O_ASYNC | O_NONBLOCK`, keeping any other status flags.
    pub fn enable_async(&self) -> io::Result<()> {
        let fd = self.as_raw_fd();
        // SAFETY: fd is a valid open descriptor owned by self.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: as above.
        let ret = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_ASYNC | libc::O_NONBLOCK) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Deliver SIGIO for this socket only to kernel thread `tid`.
    pub fn set_owner_thread(&self, tid: i32) -> io::Result<()> {
        let owner = FOwnerEx {
            kind: F_OWNER_TID,
            pid: tid,
        };
        // SAFETY: fd is valid and owner outlives the call.
        let ret = unsafe { libc::fcntl(self.as_raw_fd(), F_SETOWN_EX, &owner as *const FOwnerEx) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Current SIGIO owner, as reported by the kernel.
    pub fn sigio_owner(&self) -> io::Result<SigioOwner> {
        let mut owner = FOwnerEx { kind: 0, pid: 0 };
        // SAFETY: fd is valid and owner is writable for the duration of the call.
        let ret = unsafe { libc::fcntl(self.as_raw_fd(), F_GETOWN_EX, &mut owner as *mut FOwnerEx) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(match (owner.kind, owner.pid) {
            (_, 0) => SigioOwner::None,
            (F_OWNER_TID, pid) => SigioOwner::Thread(pid),
            (F_OWNER_PID, pid) => SigioOwner::Process(pid),
            (F_OWNER_PGRP, pid) => SigioOwner::ProcessGroup(pid),
            (_, pid) => SigioOwner::Process(pid),
        })
    }

    /// File status flags (`F_GETFL`).
    pub fn status_flags(&self) -> io::Result<libc::c_int> {
        // SAFETY: fd is a valid open descriptor owned by self.
        let flags = unsafe { libc::fcntl(self.as_raw_fd(), libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(flags)
    }

    /// Whether `O_NONBLOCK` and `O_ASYNC` are both set.
    pub fn is_async(&self) -> io::Result<bool> {
        let flags = self.status_flags()?;
        Ok(flags & libc::O_NONBLOCK != 0 && flags & libc::O_ASYNC != 0)
    }

    /// Receive one datagram without blocking.
    ///
    /// Only the SIGIO handler should call this on a live Nexus; any other
    /// caller races it for pending datagrams.
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf)
    }

    /// Bound local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

impl AsRawFd for ControlSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::identity::native_tid;

    #[test]
    fn second_bind_on_same_port_fails() {
        let first = ControlSocket::bind(0).unwrap();
        let port = first.local_addr().unwrap().port();
        let err = ControlSocket::bind(port).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }

    #[test]
    fn enable_async_sets_flags_and_never_blocks() {
        let socket = ControlSocket::bind(0).unwrap();
        assert!(!socket.is_async().unwrap());
        socket.enable_async().unwrap();
        assert!(socket.is_async().unwrap());

        let mut buf = [0u8; 16];
        let err = socket.recv_from(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn owner_round_trips_through_the_kernel() {
        let socket = ControlSocket::bind(0).unwrap();
        assert_eq!(socket.sigio_owner().unwrap(), SigioOwner::None);

        let tid = native_tid();
        socket.set_owner_thread(tid).unwrap();
        assert_eq!(socket.sigio_owner().unwrap(), SigioOwner::Thread(tid));
    }
}
