//! # Platform-Specific Implementations
//!
//! Live-process backends for [`crate::Inspector`].
//!
//! - **Linux**: `/proc/<pid>/mem` for memory, `/proc/<pid>/maps` for the load
//!   bias, and `SIGSTOP`/`SIGCONT` to hold the process still during a query.
//!   - See: [proc(5) man page](https://man7.org/linux/man-pages/man5/proc.5.html)
//!
//! Other platforms can still size objects from a [`crate::snapshot::Snapshot`].

#[cfg(target_os = "linux")]
pub mod linux;
