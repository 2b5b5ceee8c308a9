//! The process-wide Nexus.

use std::sync::{Arc, OnceLock};

use crate::lifecycle::fatal::{fatal, OrFatal};
use crate::net::identity::{local_hostname, native_tid};
use crate::net::socket::{ControlSocket, SigioOwner};
use crate::nexus::dispatch::{self, DispatchStats, StatsSnapshot};
use crate::nexus::error::BootstrapError;
use crate::nexus::hook::{AppTid, Hook};
use crate::nexus::registry::HookRegistry;

/// The one Nexus of this process, read by the SIGIO handler.
static NEXUS: OnceLock<Nexus> = OnceLock::new();

/// Session-management rendezvous point shared by all endpoints of a process.
///
/// Construct it once, on a thread that is never migrated, with
/// [`Nexus::new`]. It lives until the process exits.
#[derive(Debug)]
pub struct Nexus {
    udp_port: u16,
    hostname: String,
    socket: ControlSocket,
    owner_tid: i32,
    registry: HookRegistry,
    stats: DispatchStats,
}

impl Nexus {
    /// Bring up the control channel on `udp_port` and publish the Nexus.
    ///
    /// SIGIO for the control socket is delivered only to the calling thread.
    /// Terminates the process on any failure, including a second call.
    pub fn new(udp_port: u16) -> &'static Nexus {
        Self::bootstrap(udp_port).or_fatal("Nexus bootstrap failed")
    }

    fn bootstrap(udp_port: u16) -> Result<&'static Nexus, BootstrapError> {
        let hostname = local_hostname().map_err(BootstrapError::Hostname)?;

        let socket = ControlSocket::bind(udp_port).map_err(|source| BootstrapError::Bind {
            port: udp_port,
            source,
        })?;
        socket.enable_async().map_err(BootstrapError::AsyncFlags)?;

        let owner_tid = native_tid();
        socket
            .set_owner_thread(owner_tid)
            .map_err(|source| BootstrapError::Owner { tid: owner_tid, source })?;

        let nexus = Nexus {
            udp_port,
            hostname,
            socket,
            owner_tid,
            registry: HookRegistry::new(),
            stats: DispatchStats::default(),
        };

        // Published before the handler exists, so the handler always finds it.
        NEXUS.set(nexus).map_err(|_| BootstrapError::AlreadyConstructed {
            existing_port: NEXUS.get().map(|n| n.udp_port).unwrap_or_default(),
        })?;
        let nexus = NEXUS.get().ok_or(BootstrapError::AlreadyConstructed { existing_port: 0 })?;

        dispatch::install_sigio_handler().map_err(BootstrapError::Handler)?;

        tracing::info!(
            udp_port,
            hostname = %nexus.hostname,
            owner_tid,
            "Nexus created"
        );

        Ok(nexus)
    }

    /// The published Nexus, if one has been constructed.
    pub fn global() -> Option<&'static Nexus> {
        NEXUS.get()
    }

    /// Register `hook` so control events for its thread id reach it.
    ///
    /// Terminates the process if the hook is already registered or another
    /// registered hook has the same thread id.
    pub fn register_hook(&self, hook: &Arc<Hook>) {
        self.assert_published();

        let result = self.registry.insert(hook);
        self.rearm_if_deferred();
        if let Err(e) = result {
            fatal(e);
        }

        tracing::debug!(app_tid = %hook.app_tid(), "Hook registered");
    }

    /// Withdraw `hook`.
    ///
    /// Terminates the process if the hook is not registered.
    pub fn unregister_hook(&self, hook: &Arc<Hook>) {
        self.assert_published();

        let result = self.registry.remove(hook);
        self.rearm_if_deferred();
        if let Err(e) = result {
            fatal(e);
        }

        tracing::debug!(app_tid = %hook.app_tid(), "Hook unregistered");
    }

    /// Number of registered hooks.
    pub fn num_hooks(&self) -> usize {
        let n = self.registry.len();
        self.rearm_if_deferred();
        n
    }

    /// Thread ids of registered hooks, in registration order.
    pub fn registered_tids(&self) -> Vec<AppTid> {
        let tids = self.registry.thread_ids();
        self.rearm_if_deferred();
        tids
    }

    /// Whether a hook with `tid` is registered.
    pub fn is_registered(&self, tid: AppTid) -> bool {
        let found = self.registry.contains_tid(tid);
        self.rearm_if_deferred();
        found
    }

    /// Dispatch counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Control-plane UDP port.
    pub fn udp_port(&self) -> u16 {
        self.udp_port
    }

    /// Local hostname resolved at construction.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Kernel thread id that receives SIGIO.
    pub fn owner_tid(&self) -> i32 {
        self.owner_tid
    }

    /// SIGIO owner as currently recorded by the kernel.
    pub fn sigio_owner(&self) -> std::io::Result<SigioOwner> {
        self.socket.sigio_owner()
    }

    /// The control socket.
    pub fn control_socket(&self) -> &ControlSocket {
        &self.socket
    }

    pub(crate) fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub(crate) fn dispatch_stats(&self) -> &DispatchStats {
        &self.stats
    }

    fn assert_published(&self) {
        match NEXUS.get() {
            Some(published) if std::ptr::eq(published, self) => {}
            _ => fatal("hook operation on a Nexus that is not the published instance"),
        }
    }

    /// The handler found the registry busy and left datagrams queued: have
    /// the owning thread run it again now that the lock is free.
    fn rearm_if_deferred(&self) {
        if self.registry.take_deferred() {
            tracing::trace!(owner_tid = self.owner_tid, "Re-raising deferred SIGIO");
            dispatch::raise_sigio_at(self.owner_tid).or_fatal("tgkill(SIGIO) failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nexus::dispatch::encode_datagram;
    use crate::nexus::hook::EventCounter;
    use std::net::UdpSocket;
    use std::time::{Duration, Instant};

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        cond()
    }

    // The only test in this binary that constructs a Nexus.
    #[test]
    fn dispatch_deferred_by_held_lock_runs_once_released() {
        let owner = std::thread::spawn(|| {
            let nexus = Nexus::new(31864);
            let counter = Arc::new(EventCounter::new());
            let hook = Hook::new(AppTid(4), counter.clone());
            nexus.register_hook(&hook);

            let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
            let held = nexus.registry().try_with_hooks(|_| {
                sender
                    .send_to(&encode_datagram(AppTid(4), b"x"), ("127.0.0.1", 31864))
                    .unwrap();
                assert!(wait_for(|| nexus.stats().deferred == 1));
                nexus.stats()
            });
            let while_locked = held.expect("registry lock was free");
            assert_eq!(while_locked.delivered, 0);
            assert_eq!(while_locked.datagrams, 0);
            assert_eq!(counter.events(), 0);

            // any registry access after release re-raises the deferred SIGIO
            assert_eq!(nexus.num_hooks(), 1);
            assert!(wait_for(|| nexus.stats().delivered == 1));
            assert_eq!(counter.events(), 1);
            assert_eq!(nexus.stats().deferred, 1);
        });
        owner.join().unwrap();
    }
}
