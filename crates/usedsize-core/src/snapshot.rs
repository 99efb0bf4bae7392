//! # Snapshot Inspector
//!
//! An [`Inspector`] over an address space held in memory: a type table, a
//! symbol table and a set of mapped byte regions.
//!
//! Snapshots serve two purposes:
//! - offline analysis of a captured image whose types were described by hand
//!   or exported from another tool
//! - building synthetic process images (vectors, lists, trees) to exercise
//!   the container walks deterministically
//!
//! ## Example
//!
//! ```rust
//! use usedsize_core::snapshot::Snapshot;
//! use usedsize_core::types::TypeInfo;
//! use usedsize_core::Inspector;
//!
//! let mut snapshot = Snapshot::new(8);
//! let int = snapshot.define_type(TypeInfo::new("int", 4));
//! let at = snapshot.allocate(4);
//! snapshot.write_unsigned(at, 4, 42).unwrap();
//! snapshot.define_symbol("answer", at, int);
//!
//! let answer = snapshot.resolve("answer").unwrap();
//! assert_eq!(snapshot.read_unsigned(answer.address, 4).unwrap(), 42);
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::error::{SizeError, SizeResult};
use crate::inspector::Inspector;
use crate::types::{Address, ObjectRef, TypeId, TypeInfo};

/// Where `allocate` starts handing out memory.
const HEAP_BASE: u64 = 0x0000_5555_0000_0000;

/// Alignment of every allocation (matches glibc malloc on 64-bit targets).
const ALLOCATION_ALIGN: u64 = 16;

/// In-memory process image.
#[derive(Debug, Clone)]
pub struct Snapshot
{
    pointer_width: u64,
    types: Vec<TypeInfo>,
    type_names: HashMap<String, TypeId>,
    symbols: HashMap<String, (Address, TypeId)>,
    regions: BTreeMap<u64, Vec<u8>>,
    next_free: u64,
}

impl Snapshot
{
    /// Empty image for a process with `pointer_width`-byte pointers.
    #[must_use]
    pub fn new(pointer_width: u64) -> Self
    {
        Self {
            pointer_width,
            types: Vec::new(),
            type_names: HashMap::new(),
            symbols: HashMap::new(),
            regions: BTreeMap::new(),
            next_free: HEAP_BASE,
        }
    }

    /// Register a type; the first type registered under a name wins lookups.
    pub fn define_type(&mut self, info: TypeInfo) -> TypeId
    {
        let id = TypeId::from_raw(self.types.len() as u64);
        self.type_names.entry(info.name.clone()).or_insert(id);
        self.types.push(info);
        id
    }

    /// Make `ty` reachable under an additional name (typedefs, ABI synonyms).
    pub fn alias_type(&mut self, name: impl Into<String>, ty: TypeId)
    {
        self.type_names.insert(name.into(), ty);
    }

    /// Mutable access to a registered type, for self-referential layouts
    /// (a node type whose fields point to itself).
    pub fn type_info_mut(&mut self, ty: TypeId) -> Option<&mut TypeInfo>
    {
        usize::try_from(ty.raw()).ok().and_then(|index| self.types.get_mut(index))
    }

    /// Register a global symbol.
    pub fn define_symbol(&mut self, name: impl Into<String>, address: Address, ty: TypeId)
    {
        self.symbols.insert(name.into(), (address, ty));
    }

    /// Map `bytes` at `address`.
    ///
    /// Regions must not overlap; a later region starting at the same address
    /// replaces the earlier one.
    pub fn map_region(&mut self, address: Address, bytes: Vec<u8>)
    {
        self.regions.insert(address.value(), bytes);
    }

    /// Map a fresh zeroed block of `size` bytes and return its address.
    pub fn allocate(&mut self, size: u64) -> Address
    {
        let address = Address::new(self.next_free);
        let len = usize::try_from(size.max(1)).unwrap_or(usize::MAX);
        self.regions.insert(address.value(), vec![0; len]);
        let span = size.max(1).div_ceil(ALLOCATION_ALIGN) * ALLOCATION_ALIGN;
        self.next_free += span + ALLOCATION_ALIGN;
        address
    }

    /// Store a pointer-sized value.
    pub fn write_pointer(&mut self, address: Address, value: Address) -> SizeResult<()>
    {
        let width = self.pointer_width;
        self.write_unsigned(address, width, value.value())
    }

    fn region_range(&self, address: Address, len: usize) -> SizeResult<(u64, usize)>
    {
        let fail = |details: &str| SizeError::MemoryRead {
            address,
            length: len,
            details: details.to_string(),
        };
        let (&start, bytes) = self
            .regions
            .range(..=address.value())
            .next_back()
            .ok_or_else(|| fail("address is not mapped"))?;
        let begin = usize::try_from(address.value() - start).map_err(|_| fail("address is not mapped"))?;
        let end = begin.checked_add(len).ok_or_else(|| fail("range overflows"))?;
        if end > bytes.len() {
            return Err(fail("range crosses the end of a mapped region"));
        }
        Ok((start, begin))
    }
}

impl Inspector for Snapshot
{
    fn pointer_width(&self) -> u64
    {
        self.pointer_width
    }

    fn symbol(&self, name: &str) -> SizeResult<ObjectRef>
    {
        self.symbols
            .get(name)
            .map(|&(address, ty)| ObjectRef::new(name, address, ty))
            .ok_or_else(|| SizeError::UnresolvedSymbol(format!("no symbol \"{name}\" in current context")))
    }

    fn lookup_type(&self, name: &str) -> SizeResult<TypeId>
    {
        self.type_names
            .get(name.trim())
            .copied()
            .ok_or_else(|| SizeError::UnresolvedSymbol(format!("no type named {name}")))
    }

    fn type_info(&self, ty: TypeId) -> SizeResult<&TypeInfo>
    {
        usize::try_from(ty.raw())
            .ok()
            .and_then(|index| self.types.get(index))
            .ok_or_else(|| SizeError::UnresolvedSymbol(format!("unknown {ty}")))
    }

    fn read_memory(&self, address: Address, buf: &mut [u8]) -> SizeResult<()>
    {
        let (start, begin) = self.region_range(address, buf.len())?;
        let bytes = &self.regions[&start];
        buf.copy_from_slice(&bytes[begin..begin + buf.len()]);
        Ok(())
    }

    fn write_memory(&mut self, address: Address, data: &[u8]) -> SizeResult<()>
    {
        let (start, begin) = self.region_range(address, data.len())?;
        if let Some(bytes) = self.regions.get_mut(&start) {
            bytes[begin..begin + data.len()].copy_from_slice(data);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_allocations_do_not_touch()
    {
        let mut snapshot = Snapshot::new(8);
        let a = snapshot.allocate(24);
        let b = snapshot.allocate(1);
        assert!(b.value() >= a.value() + 24);
        assert_eq!(a.value() % ALLOCATION_ALIGN, 0);
        assert_eq!(b.value() % ALLOCATION_ALIGN, 0);
    }

    #[test]
    fn test_read_outside_region_fails()
    {
        let mut snapshot = Snapshot::new(8);
        let a = snapshot.allocate(8);
        assert!(snapshot.read_pointer(a).is_ok());
        assert!(matches!(
            snapshot.read_pointer(a + 4).unwrap_err(),
            SizeError::MemoryRead { .. }
        ));
        assert!(snapshot.read_pointer(Address::new(0x10)).is_err());
    }

    #[test]
    fn test_pointer_width_round_trip()
    {
        let mut snapshot = Snapshot::new(4);
        let a = snapshot.allocate(4);
        snapshot.write_pointer(a, Address::new(0xdead_beef)).unwrap();
        assert_eq!(snapshot.read_pointer(a).unwrap(), Address::new(0xdead_beef));
        assert_eq!(snapshot.read_unsigned(a, 2).unwrap(), 0xbeef);
    }

    #[test]
    fn test_first_definition_wins_name_lookup()
    {
        let mut snapshot = Snapshot::new(8);
        let first = snapshot.define_type(TypeInfo::new("T", 1));
        snapshot.define_type(TypeInfo::new("T", 2));
        assert_eq!(snapshot.lookup_type("T").unwrap(), first);
        assert!(snapshot.lookup_type("U").is_err());
    }
}
