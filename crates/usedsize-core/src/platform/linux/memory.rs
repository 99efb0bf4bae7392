//! # Linux Memory Operations
//!
//! Memory reading and writing through `/proc/<pid>/mem`.
//!
//! The file is indexed by virtual address, so a read at offset `addr` returns
//! the bytes at `addr` in the target. Access needs the same permission as
//! `ptrace` attach (same user and a permissive `ptrace_scope`, or
//! `CAP_SYS_PTRACE`).
//!
//! ## References
//!
//! - [proc(5): /proc/pid/mem](https://man7.org/linux/man-pages/man5/proc.5.html)

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;

use tracing::{debug, trace};

use crate::error::{SizeError, SizeResult};
use crate::types::{Address, ProcessId};

/// Open handle on a process's address space.
pub struct ProcessMemory
{
    pid: ProcessId,
    file: File,
    writable: bool,
}

impl ProcessMemory
{
    /// Open the address space of `pid`, for writing too when the kernel
    /// allows it.
    ///
    /// ## Errors
    ///
    /// - `Io`: the process does not exist or may not be inspected
    pub fn open(pid: ProcessId) -> SizeResult<Self>
    {
        let path = format!("/proc/{pid}/mem");
        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => Ok(Self {
                pid,
                file,
                writable: true,
            }),
            Err(err) => {
                debug!(pid = %pid, error = %err, "opening process memory read-only");
                Ok(Self {
                    pid,
                    file: File::open(&path)?,
                    writable: false,
                })
            }
        }
    }

    /// Process whose memory this is.
    pub fn pid(&self) -> ProcessId
    {
        self.pid
    }

    /// Whether [`Self::write`] can succeed.
    pub fn is_writable(&self) -> bool
    {
        self.writable
    }

    /// Fill `buf` from `address`.
    ///
    /// ## Errors
    ///
    /// - `MemoryRead`: the range is unmapped or unreadable
    pub fn read(&self, address: Address, buf: &mut [u8]) -> SizeResult<()>
    {
        trace!(address = %address, len = buf.len(), "reading process memory");
        self.file
            .read_exact_at(buf, address.value())
            .map_err(|err| SizeError::MemoryRead {
                address,
                length: buf.len(),
                details: err.to_string(),
            })
    }

    /// Write `data` at `address`.
    ///
    /// ## Errors
    ///
    /// - `Unsupported`: the memory file was opened read-only
    /// - `Io`: the kernel rejected the write
    pub fn write(&self, address: Address, data: &[u8]) -> SizeResult<()>
    {
        if !self.writable {
            return Err(SizeError::Unsupported(format!(
                "writing to process {}: memory is open read-only",
                self.pid
            )));
        }
        debug!(address = %address, len = data.len(), "writing process memory");
        self.file.write_all_at(data, address.value())?;
        Ok(())
    }
}
