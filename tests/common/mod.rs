//! Shared utilities for Nexus integration tests.
//!
//! The Nexus is a process singleton and its failures exit the process, so
//! every scenario runs in a child process: the test re-executes its own binary
//! filtered to itself, with an environment marker telling it to run the body.

#![allow(dead_code)]

use std::net::UdpSocket;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rpc_nexus::net::native_tid;
use rpc_nexus::nexus::{encode_datagram, AppTid, EventCounter, Hook, Nexus};

pub const CHILD_ENV: &str = "RPC_NEXUS_TEST_CHILD";

/// True when running as the child for `test`.
pub fn is_child(test: &str) -> bool {
    std::env::var(CHILD_ENV).map_or(false, |v| v == test)
}

/// Run `test` alone in a fresh process and collect its output.
pub fn run_child(test: &str) -> Output {
    Command::new(std::env::current_exe().expect("test binary path"))
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, test)
        .output()
        .expect("failed to spawn child test process")
}

pub fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

pub fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

/// The child terminated through the fatal path with `needle` in its diagnostic.
pub fn assert_fatal(out: &Output, needle: &str) {
    let err = stderr(out);
    assert_eq!(out.status.code(), Some(1), "expected fatal exit, stderr: {}", err);
    assert!(err.contains("FATAL"), "no FATAL diagnostic in stderr: {}", err);
    assert!(err.contains(needle), "stderr missing {:?}: {}", needle, err);
}

/// The child ran to completion.
pub fn assert_clean(out: &Output) {
    assert!(
        out.status.success(),
        "child failed ({:?})\nstdout: {}\nstderr: {}",
        out.status,
        stdout(out),
        stderr(out)
    );
}

/// A parked thread that constructed the Nexus and receives its SIGIO.
pub struct OwnerThread {
    pub nexus: &'static Nexus,
    pub tid: i32,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl OwnerThread {
    pub fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        self.handle.thread().unpark();
        self.handle.join().unwrap();
    }
}

/// Construct the Nexus on a dedicated thread that then parks.
pub fn spawn_owner(port: u16) -> OwnerThread {
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let owner_stop = stop.clone();

    let handle = thread::Builder::new()
        .name("nexus-owner".into())
        .spawn(move || {
            let nexus = Nexus::new(port);
            tx.send((nexus, native_tid())).unwrap();
            while !owner_stop.load(Ordering::SeqCst) {
                thread::park();
            }
        })
        .unwrap();

    let (nexus, tid) = rx.recv().expect("owner thread exited before constructing the Nexus");
    OwnerThread { nexus, tid, stop, handle }
}

/// Run `f` on a fresh named thread and wait for it.
pub fn on_thread<F>(name: &str, f: F)
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}

pub fn counting_hook(tid: u8) -> (Arc<Hook>, Arc<EventCounter>) {
    let counter = Arc::new(EventCounter::new());
    (Hook::new(AppTid(tid), counter.clone()), counter)
}

/// Registry contents formatted as `[a, b, ...]`.
pub fn registry_line(nexus: &Nexus) -> String {
    let tids: Vec<u8> = nexus.registered_tids().into_iter().map(u8::from).collect();
    format!("registry={:?}", tids)
}

/// Send a framed control datagram to the Nexus on `port`.
pub fn send_control(port: u16, dest: u8, payload: &[u8]) {
    send_raw(port, &encode_datagram(AppTid(dest), payload));
}

pub fn send_raw(port: u16, datagram: &[u8]) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.send_to(datagram, ("127.0.0.1", port)).unwrap();
}

/// Poll `cond` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}
