//! # Inspector Trait
//!
//! The interface to whatever gives us access to the inspected process: its
//! address space and its static type metadata.
//!
//! Size resolution never talks to a process directly. It issues a handful of
//! calls through this trait, so the same container walks run against a live
//! Linux process ([`crate::platform::linux::ProcessInspector`]), against a
//! captured or synthetic image ([`crate::snapshot::Snapshot`]), or against
//! anything else that can answer these questions.
//!
//! ## Primitives and provided methods
//!
//! Backends implement the primitives (symbol and type lookup, type metadata,
//! raw memory access). Everything built on top of them (expression
//! resolution, integer and pointer decoding, member search) is a provided
//! method, so every backend interprets memory the same way.

use crate::error::{SizeError, SizeResult};
use crate::expr;
use crate::types::{Address, Field, ObjectRef, TypeId, TypeInfo};

/// How deep `find_member` descends through nested members and base classes.
const MAX_MEMBER_DEPTH: usize = 16;

/// Access to a halted process's memory and debug information.
///
/// ## Thread Safety
///
/// Inspectors are used from a single thread for the duration of a query.
/// Queries are synchronous and assume the process does not run while they
/// are in flight.
pub trait Inspector
{
    /// Size of a pointer in the inspected process, in bytes.
    fn pointer_width(&self) -> u64;

    /// Byte order of the inspected process.
    fn little_endian(&self) -> bool
    {
        true
    }

    /// Resolve a global symbol to its address and static type.
    ///
    /// ## Errors
    ///
    /// - `UnresolvedSymbol`: no global with this name is known
    fn symbol(&self, name: &str) -> SizeResult<ObjectRef>;

    /// Look up a type by its canonical name.
    ///
    /// ## Errors
    ///
    /// - `UnresolvedSymbol`: no type with this name is known
    fn lookup_type(&self, name: &str) -> SizeResult<TypeId>;

    /// Metadata for a type handle issued by this inspector.
    fn type_info(&self, ty: TypeId) -> SizeResult<&TypeInfo>;

    /// Fill `buf` with the bytes starting at `address`.
    ///
    /// ## Errors
    ///
    /// - `MemoryRead`: the range is not readable
    fn read_memory(&self, address: Address, buf: &mut [u8]) -> SizeResult<()>;

    /// Write `data` at `address`.
    ///
    /// The default implementation refuses: most inspectors are read-only.
    fn write_memory(&mut self, address: Address, data: &[u8]) -> SizeResult<()>
    {
        Err(SizeError::Unsupported(format!(
            "writing {} bytes at {address}: inspector is read-only",
            data.len()
        )))
    }

    /// Resolve an object expression such as `mnodeman`, `mn.vchSig`,
    /// `*pmn` or `*(CMasternode*)0x5555deadbeef`.
    fn resolve(&self, expression: &str) -> SizeResult<ObjectRef>
    {
        expr::evaluate(self, expression)
    }

    /// Canonical name of a type.
    fn type_name(&self, ty: TypeId) -> SizeResult<&str>
    {
        Ok(&self.type_info(ty)?.name)
    }

    /// Shallow (`sizeof`) size of a type.
    fn byte_size(&self, ty: TypeId) -> SizeResult<u64>
    {
        Ok(self.type_info(ty)?.byte_size)
    }

    /// Template argument `index` of a template instantiation.
    fn template_argument(&self, ty: TypeId, index: usize) -> SizeResult<TypeId>
    {
        let info = self.type_info(ty)?;
        info.template_args.get(index).copied().ok_or_else(|| {
            SizeError::UnresolvedSymbol(format!("template argument {index} of {}", info.name))
        })
    }

    /// Fields of a composite type, static ones included.
    fn fields(&self, ty: TypeId) -> SizeResult<&[Field]>
    {
        Ok(&self.type_info(ty)?.fields)
    }

    /// Read an unsigned integer of `width` bytes (1 to 8).
    fn read_unsigned(&self, address: Address, width: u64) -> SizeResult<u64>
    {
        let width = integer_width(width)?;
        let mut bytes = [0u8; 8];
        if self.little_endian() {
            self.read_memory(address, &mut bytes[..width])?;
            Ok(u64::from_le_bytes(bytes))
        } else {
            self.read_memory(address, &mut bytes[8 - width..])?;
            Ok(u64::from_be_bytes(bytes))
        }
    }

    /// Read a pointer-sized value.
    fn read_pointer(&self, address: Address) -> SizeResult<Address>
    {
        self.read_unsigned(address, self.pointer_width()).map(Address::from)
    }

    /// Write an unsigned integer of `width` bytes (1 to 8), truncating `value`.
    fn write_unsigned(&mut self, address: Address, width: u64, value: u64) -> SizeResult<()>
    {
        let width = integer_width(width)?;
        if self.little_endian() {
            let bytes = value.to_le_bytes();
            self.write_memory(address, &bytes[..width])
        } else {
            let bytes = value.to_be_bytes();
            self.write_memory(address, &bytes[8 - width..])
        }
    }

    /// Locate a data member by name anywhere inside `ty`.
    ///
    /// Direct members win; otherwise base-class slots and nested composite
    /// members are searched depth-first in declaration order. Returns the
    /// member's byte offset from the start of `ty` and its declared type.
    fn find_member(&self, ty: TypeId, name: &str) -> SizeResult<Option<(u64, TypeId)>>
    {
        find_member_at_depth(self, ty, name, 0)
    }

    /// The member `name` of a live object.
    ///
    /// ## Errors
    ///
    /// - `UnresolvedSymbol`: the object's type has no such member
    fn member(&self, object: &ObjectRef, name: &str) -> SizeResult<ObjectRef>
    {
        match self.find_member(object.ty, name)? {
            Some((offset, ty)) => Ok(object.child(&format!(".{name}"), offset, ty)),
            None => Err(SizeError::UnresolvedSymbol(format!(
                "{}.{name} (no such member in {})",
                object.name,
                self.type_name(object.ty)?
            ))),
        }
    }
}

fn integer_width(width: u64) -> SizeResult<usize>
{
    match usize::try_from(width) {
        Ok(width @ 1..=8) => Ok(width),
        _ => Err(SizeError::Unsupported(format!("{width}-byte integer access"))),
    }
}

fn find_member_at_depth<I>(inspector: &I, ty: TypeId, name: &str, depth: usize) -> SizeResult<Option<(u64, TypeId)>>
where
    I: Inspector + ?Sized,
{
    if depth > MAX_MEMBER_DEPTH {
        return Ok(None);
    }

    let info = inspector.type_info(ty)?;
    for field in &info.fields {
        if let (false, Some(offset)) = (field.is_base_class, field.offset) {
            if field.name == name {
                return Ok(Some((offset, field.ty)));
            }
        }
    }

    for field in &info.fields {
        let Some(offset) = field.offset else {
            continue;
        };
        let nested = inspector.type_info(field.ty)?;
        if nested.fields.is_empty() || nested.is_pointer() {
            continue;
        }
        if let Some((inner, found)) = find_member_at_depth(inspector, field.ty, name, depth + 1)? {
            return Ok(Some((offset + inner, found)));
        }
    }

    Ok(None)
}
