//! Fail-fast termination.
//!
//! Bootstrap failures and registry invariant violations are not recoverable:
//! the process reports a diagnostic on stderr and exits with a non-zero status.

use std::fmt::Display;
use std::io::Write;

/// Exit status used for every fatal path.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Report `msg` and terminate the process.
pub fn fatal(msg: impl Display) -> ! {
    tracing::error!(reason = %msg, "Nexus fatal error, terminating");

    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    let _ = writeln!(out, "rpc-nexus: FATAL. {}", msg);
    let _ = out.flush();

    std::process::exit(FATAL_EXIT_CODE);
}

/// Converts a failed `Result` into a fatal exit.
pub trait OrFatal<T> {
    /// Unwrap the value or terminate with `context` and the error.
    fn or_fatal(self, context: &str) -> T;
}

impl<T, E: Display> OrFatal<T> for Result<T, E> {
    fn or_fatal(self, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(e) => fatal(format_args!("{}: {}", context, e)),
        }
    }
}
