//! Process and memory mapping types.

use std::fmt;
use std::path::PathBuf;

use super::Address;

/// Process identifier (PID).
///
/// ## Example
///
/// ```rust
/// use usedsize_core::types::ProcessId;
///
/// let pid = ProcessId::from(4242);
/// assert_eq!(pid.to_string(), "4242");
/// assert_eq!(u32::from(pid), 4242);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

impl From<u32> for ProcessId
{
    fn from(pid: u32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// One mapping of a process's address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion
{
    /// First address of the mapping (inclusive).
    pub start: Address,

    /// End of the mapping (exclusive).
    pub end: Address,

    /// Permission string as the kernel prints it, e.g. `"r-xp"`.
    pub permissions: String,

    /// Offset of the mapping into the backing file.
    pub file_offset: u64,

    /// Backing file, if the mapping has one. Pseudo paths such as `[heap]`
    /// are kept verbatim.
    pub path: Option<PathBuf>,
}

impl MemoryRegion
{
    /// Size of the region in bytes.
    pub fn size(&self) -> u64
    {
        self.end.value().saturating_sub(self.start.value())
    }

    /// Whether the region can be read.
    pub fn is_readable(&self) -> bool
    {
        self.permissions.starts_with('r')
    }

    /// Whether `address` falls inside the region.
    pub fn contains(&self, address: Address) -> bool
    {
        address >= self.start && address < self.end
    }
}
