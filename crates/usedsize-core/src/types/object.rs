//! Static type descriptors and addressable objects.

use std::fmt;

use smallvec::SmallVec;

use super::Address;

/// Opaque handle identifying a static type inside one inspector.
///
/// Handles are only meaningful for the inspector that issued them. The DWARF
/// catalog uses DIE section offsets, the snapshot backend uses table indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u64);

impl TypeId
{
    /// Create a handle from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self
    {
        Self(value)
    }

    /// Raw numeric representation (useful for logging / errors).
    #[must_use]
    pub const fn raw(self) -> u64
    {
        self.0
    }
}

impl fmt::Display for TypeId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "type#{:x}", self.0)
    }
}

/// One field slot of a composite type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field
{
    /// Member name; empty for base-class slots and anonymous members.
    pub name: String,
    /// Declared type of the slot.
    pub ty: TypeId,
    /// Byte offset from the start of the owning object.
    ///
    /// `None` marks a static (class-level) field, which occupies no storage in
    /// the instance and is skipped by size accounting.
    pub offset: Option<u64>,
    /// Whether the slot holds a base-class subobject rather than a data member.
    pub is_base_class: bool,
}

impl Field
{
    /// Instance data member at `offset`.
    pub fn member(name: impl Into<String>, ty: TypeId, offset: u64) -> Self
    {
        Self {
            name: name.into(),
            ty,
            offset: Some(offset),
            is_base_class: false,
        }
    }

    /// Base-class subobject at `offset`.
    pub fn base(ty: TypeId, offset: u64) -> Self
    {
        Self {
            name: String::new(),
            ty,
            offset: Some(offset),
            is_base_class: true,
        }
    }

    /// Static member: declared on the type, stored elsewhere.
    pub fn static_member(name: impl Into<String>, ty: TypeId) -> Self
    {
        Self {
            name: name.into(),
            ty,
            offset: None,
            is_base_class: false,
        }
    }

    /// Whether the field lives outside the instance.
    pub fn is_static(&self) -> bool
    {
        self.offset.is_none()
    }
}

/// Everything the inspector knows about a static type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo
{
    /// Canonical name, e.g. `std::vector<int, std::allocator<int> >`.
    pub name: String,
    /// Shallow size (`sizeof`).
    pub byte_size: u64,
    /// Template arguments in declaration order.
    pub template_args: SmallVec<[TypeId; 4]>,
    /// Instance and static fields in declaration order.
    pub fields: Vec<Field>,
    /// Target type when this is a pointer or reference.
    pub pointee: Option<TypeId>,
}

impl TypeInfo
{
    /// Type with a name and size and nothing else (scalars, opaque records).
    pub fn new(name: impl Into<String>, byte_size: u64) -> Self
    {
        Self {
            name: name.into(),
            byte_size,
            template_args: SmallVec::new(),
            fields: Vec::new(),
            pointee: None,
        }
    }

    /// Pointer type named `<pointee name>*`.
    pub fn pointer(name: impl Into<String>, width: u64, pointee: TypeId) -> Self
    {
        Self {
            pointee: Some(pointee),
            ..Self::new(name, width)
        }
    }

    /// Builder: append template arguments.
    #[must_use]
    pub fn with_template_args(mut self, args: impl IntoIterator<Item = TypeId>) -> Self
    {
        self.template_args.extend(args);
        self
    }

    /// Builder: append a field.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self
    {
        self.fields.push(field);
        self
    }

    /// Whether values of this type are pointers.
    pub fn is_pointer(&self) -> bool
    {
        self.pointee.is_some()
    }
}

/// An addressable object in the inspected process: where it lives and what
/// its static type is.
///
/// Never cached across queries; the inspected process may move or free the
/// object between two commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef
{
    /// Expression naming the object (used in diagnostics and log lines).
    pub name: String,
    /// Start of the object.
    pub address: Address,
    /// Static type the object is viewed as.
    pub ty: TypeId,
}

impl ObjectRef
{
    /// Create a reference to an object.
    pub fn new(name: impl Into<String>, address: Address, ty: TypeId) -> Self
    {
        Self {
            name: name.into(),
            address,
            ty,
        }
    }

    /// Same storage viewed as another type (base-class slots, recipes).
    #[must_use]
    pub fn viewed_as(&self, ty: TypeId) -> Self
    {
        Self {
            name: self.name.clone(),
            address: self.address,
            ty,
        }
    }

    /// Subobject `offset` bytes in, named `<name><suffix>`.
    #[must_use]
    pub fn child(&self, suffix: &str, offset: u64, ty: TypeId) -> Self
    {
        Self {
            name: format!("{}{suffix}", self.name),
            address: self.address + offset,
            ty,
        }
    }
}

impl fmt::Display for ObjectRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} @ {}", self.name, self.address)
    }
}
