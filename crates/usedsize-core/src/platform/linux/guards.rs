//! # RAII Guards for Live Processes
//!
//! Size queries assume the inspected process does not run while they read
//! its memory. [`StopGuard`] stops the process with `SIGSTOP` and sends
//! `SIGCONT` when dropped, so the process resumes even when the query fails.
//!
//! ## Example
//!
//! ```rust,no_run
//! use usedsize_core::platform::linux::StopGuard;
//! use usedsize_core::types::ProcessId;
//!
//! let guard = StopGuard::new(ProcessId::from(4242))?;
//! // The process is stopped; inspect it here.
//! drop(guard); // SIGCONT
//! # Ok::<(), usedsize_core::SizeError>(())
//! ```

use std::fs;
use std::io;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{SizeError, SizeResult};
use crate::types::ProcessId;

/// How long to wait for the kernel to report the process stopped.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(5);
const STOP_POLL_ATTEMPTS: u32 = 400;

/// Stops a process on creation and continues it on drop.
///
/// A process that is already stopped (by a debugger or job control) is left
/// alone and not continued on drop.
pub struct StopGuard
{
    pid: ProcessId,
    active: bool,
}

impl StopGuard
{
    /// Stop `pid` and wait until the kernel reports it stopped.
    ///
    /// ## Errors
    ///
    /// - `Io`: the signal could not be sent, `/proc/<pid>/stat` could not be
    ///   read, or the process did not stop in time
    pub fn new(pid: ProcessId) -> SizeResult<Self>
    {
        if is_stopped(pid)? {
            debug!(pid = %pid, "process already stopped");
            return Ok(Self { pid, active: false });
        }

        send_signal(pid, libc::SIGSTOP)?;
        let guard = Self { pid, active: true };
        for _ in 0..STOP_POLL_ATTEMPTS {
            if is_stopped(pid)? {
                debug!(pid = %pid, "process stopped");
                return Ok(guard);
            }
            thread::sleep(STOP_POLL_INTERVAL);
        }

        // Dropping the guard continues the process.
        Err(SizeError::Io(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("process {pid} did not stop"),
        )))
    }

    /// Continue the process now instead of on drop.
    pub fn resume(mut self) -> SizeResult<()>
    {
        if self.active {
            self.active = false;
            send_signal(self.pid, libc::SIGCONT)?;
        }
        Ok(())
    }
}

impl Drop for StopGuard
{
    fn drop(&mut self)
    {
        if self.active {
            // Best effort resume
            if let Err(err) = send_signal(self.pid, libc::SIGCONT) {
                warn!(pid = %self.pid, error = %err, "failed to continue process");
            }
        }
    }
}

fn send_signal(pid: ProcessId, signal: libc::c_int) -> SizeResult<()>
{
    let raw = libc::pid_t::try_from(pid.0)
        .map_err(|_| SizeError::Unsupported(format!("process id {pid} out of range")))?;
    let result = unsafe { libc::kill(raw, signal) };
    if result != 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}

fn is_stopped(pid: ProcessId) -> SizeResult<bool>
{
    let stat = fs::read_to_string(format!("/proc/{pid}/stat"))?;
    Ok(matches!(process_state(&stat), Some('T' | 't')))
}

/// State letter from the text of `/proc/<pid>/stat`.
///
/// The command name may contain spaces and parentheses, so the state is
/// taken after the last `)`.
fn process_state(stat: &str) -> Option<char>
{
    let (_, rest) = stat.rsplit_once(')')?;
    rest.trim_start().chars().next()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_process_state()
    {
        assert_eq!(process_state("4242 (dashd) S 1 4242 4242 0 -1"), Some('S'));
        assert_eq!(process_state("4242 (odd) name)) T 1 4242"), Some('T'));
        assert_eq!(process_state("garbage"), None);
    }

    #[test]
    fn test_own_process_is_running()
    {
        let pid = ProcessId::from(std::process::id());
        assert!(!is_stopped(pid).unwrap());
    }
}
