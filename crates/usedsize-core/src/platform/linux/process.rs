//! [`crate::Inspector`] over a live Linux process.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::maps;
use super::memory::ProcessMemory;
use crate::error::SizeResult;
use crate::inspector::Inspector;
use crate::symbols::DwarfCatalog;
use crate::types::{Address, ObjectRef, ProcessId, TypeId, TypeInfo};

/// A running process: its executable's debug information plus its memory.
///
/// Only the main executable's debug information is loaded; globals living in
/// shared libraries are not visible.
pub struct ProcessInspector
{
    pid: ProcessId,
    executable: PathBuf,
    catalog: DwarfCatalog,
    memory: ProcessMemory,
    load_bias: u64,
}

impl ProcessInspector
{
    /// Load the executable of `pid` and open its memory.
    ///
    /// ## Errors
    ///
    /// - `Io`: the process does not exist or may not be inspected
    /// - `Dwarf`: the executable's debug information cannot be parsed
    pub fn attach(pid: ProcessId) -> SizeResult<Self>
    {
        let exe_link = PathBuf::from(format!("/proc/{pid}/exe"));
        let executable = fs::read_link(&exe_link)?;
        let catalog = DwarfCatalog::load(&exe_link)?;

        let regions = maps::read_maps(pid)?;
        let load_bias = maps::load_bias(&regions, &executable, catalog.image().link_base()).unwrap_or_else(|| {
            warn!(pid = %pid, executable = %executable.display(), "executable mapping not found; assuming no load bias");
            0
        });
        let memory = ProcessMemory::open(pid)?;

        info!(
            pid = %pid,
            executable = %executable.display(),
            load_bias = %Address::from(load_bias),
            writable = memory.is_writable(),
            "attached to process"
        );
        Ok(Self {
            pid,
            executable,
            catalog,
            memory,
            load_bias,
        })
    }

    /// Inspected process.
    pub fn pid(&self) -> ProcessId
    {
        self.pid
    }

    /// Path `/proc/<pid>/exe` pointed at when attaching.
    pub fn executable(&self) -> &Path
    {
        &self.executable
    }

    /// Types and globals of the executable.
    pub fn catalog(&self) -> &DwarfCatalog
    {
        &self.catalog
    }

    /// Runtime address minus link-time address of the executable.
    pub fn load_bias(&self) -> u64
    {
        self.load_bias
    }
}

impl Inspector for ProcessInspector
{
    fn pointer_width(&self) -> u64
    {
        self.catalog.pointer_width()
    }

    fn little_endian(&self) -> bool
    {
        self.catalog.little_endian()
    }

    fn symbol(&self, name: &str) -> SizeResult<ObjectRef>
    {
        let global = self.catalog.global(name)?;
        Ok(ObjectRef::new(
            name,
            Address::from(global.address.wrapping_add(self.load_bias)),
            global.ty,
        ))
    }

    fn lookup_type(&self, name: &str) -> SizeResult<TypeId>
    {
        self.catalog.lookup_type(name)
    }

    fn type_info(&self, ty: TypeId) -> SizeResult<&TypeInfo>
    {
        self.catalog.type_info(ty)
    }

    fn read_memory(&self, address: Address, buf: &mut [u8]) -> SizeResult<()>
    {
        self.memory.read(address, buf)
    }

    fn write_memory(&mut self, address: Address, data: &[u8]) -> SizeResult<()>
    {
        self.memory.write(address, data)
    }
}
