//! Host and thread identity.

use std::ffi::CStr;
use std::io;

/// Buffer size handed to `gethostname`.
pub const MAX_HOSTNAME_LEN: usize = 128;

/// Local hostname, as reported by `gethostname(2)`.
pub fn local_hostname() -> io::Result<String> {
    let mut buf = [0u8; MAX_HOSTNAME_LEN];
    // SAFETY: buf is writable for buf.len() bytes.
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }

    // POSIX leaves truncated names unterminated
    buf[MAX_HOSTNAME_LEN - 1] = 0;
    let name = CStr::from_bytes_until_nul(&buf)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(name.to_string_lossy().into_owned())
}

/// Native kernel thread id of the calling thread.
pub fn native_tid() -> i32 {
    // SAFETY: SYS_gettid always returns a valid TID on Linux.
    unsafe { libc::syscall(libc::SYS_gettid) as i32 }
}

/// Process id of the calling process.
pub fn process_id() -> i32 {
    // SAFETY: getpid has no preconditions.
    unsafe { libc::getpid() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_not_empty() {
        let name = local_hostname().unwrap();
        assert!(!name.is_empty());
        assert!(name.len() < MAX_HOSTNAME_LEN);
    }

    #[test]
    fn spawned_thread_has_its_own_tid() {
        let main_tid = native_tid();
        let other = std::thread::spawn(native_tid).join().unwrap();
        assert_ne!(main_tid, other);
        assert_ne!(other, process_id());
    }
}
