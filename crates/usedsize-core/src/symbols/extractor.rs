//! DWARF type extraction.
//!
//! A single depth-first pass over every unit records the type-shaped DIEs
//! (records, base types, pointers, arrays, typedefs and cv-qualifiers) and the
//! variables, keyed by their section offset. A second step resolves the
//! references between them: typedefs and qualifiers become transparent,
//! declarations are linked to the definition with the same name, and every
//! remaining type gets a [`TypeId`].

use std::collections::HashMap;

use gimli::{
    constants, AttributeValue, DebuggingInformationEntry, DwAt, Reader, Unit, UnitSectionOffset, UnitType,
};
use tracing::debug;

use super::{map_dwarf_error, OwnedDwarf, OwnedReader};
use crate::error::SizeResult;
use crate::types::{Field, TypeId, TypeInfo};

const MAX_TYPE_REF_DEPTH: usize = 32;

/// Name given to namespaces without one, as debuggers print them.
const ANONYMOUS_NAMESPACE: &str = "(anonymous namespace)";

/// A global variable with a static address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalVariable
{
    /// Link-time address.
    pub address: u64,
    pub ty: TypeId,
}

/// Everything the catalog answers from.
#[derive(Debug, Default)]
pub(crate) struct CatalogTables
{
    pub types: Vec<TypeInfo>,
    pub names: HashMap<String, TypeId>,
    pub short_names: HashMap<String, TypeId>,
    pub globals: HashMap<String, GlobalVariable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TypeRef
{
    Offset(UnitSectionOffset),
    Signature(u64),
}

#[derive(Debug)]
struct RawField
{
    name: String,
    ty: Option<TypeRef>,
    offset: Option<u64>,
    is_base_class: bool,
}

#[derive(Debug)]
enum RawKind
{
    Named
    {
        size: Option<u64>,
        declaration: bool,
        fields: Vec<RawField>,
        template_args: Vec<TypeRef>,
    },
    Pointer(Option<TypeRef>),
    Array
    {
        element: Option<TypeRef>,
        count: Option<u64>,
    },
    /// Typedefs and cv-qualifiers: the same type under another spelling.
    Alias(Option<TypeRef>),
}

#[derive(Debug)]
struct RawType
{
    name: Option<String>,
    kind: RawKind,
}

#[derive(Debug)]
struct RawVariable
{
    name: Option<String>,
    ty: Option<TypeRef>,
    specification: Option<TypeRef>,
    address: Option<u64>,
    top_level: bool,
}

enum Scope
{
    Unit,
    Namespace(String),
    Record
    {
        raw: usize,
        name: String,
        union: bool,
    },
    Array(usize),
    Other,
}

impl Scope
{
    fn prefix(&self) -> &str
    {
        match self {
            Scope::Namespace(name) | Scope::Record { name, .. } => name,
            _ => "",
        }
    }
}

fn qualify(parent: Option<&Scope>, name: &str) -> String
{
    match parent.map(Scope::prefix) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}::{name}"),
        _ => name.to_string(),
    }
}

/// Last `::` component of a qualified name, ignoring separators inside
/// template arguments.
pub(crate) fn short_name(name: &str) -> &str
{
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in name.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ':' if depth == 0 && name[index..].starts_with("::") => start = index + 2,
            _ => {}
        }
    }
    &name[start..]
}

pub(crate) struct CatalogBuilder<'a>
{
    dwarf: &'a OwnedDwarf,
    pointer_width: u64,
    raw: Vec<RawType>,
    raw_index: HashMap<TypeRef, usize>,
    variables: Vec<RawVariable>,
    variable_index: HashMap<TypeRef, usize>,
}

impl<'a> CatalogBuilder<'a>
{
    pub(crate) fn new(dwarf: &'a OwnedDwarf, pointer_width: u64) -> Self
    {
        Self {
            dwarf,
            pointer_width,
            raw: Vec::new(),
            raw_index: HashMap::new(),
            variables: Vec::new(),
            variable_index: HashMap::new(),
        }
    }

    /// Scan every compilation and type unit, then resolve.
    pub(crate) fn build(mut self) -> SizeResult<CatalogTables>
    {
        let mut headers = self.dwarf.units();
        while let Some(header) = headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_info unit header", err))?
        {
            let unit = self
                .dwarf
                .unit(header)
                .map_err(|err| map_dwarf_error("parsing compilation unit", err))?;
            self.scan_unit(&unit)?;
        }

        let mut type_headers = self.dwarf.type_units();
        while let Some(header) = type_headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_types unit header", err))?
        {
            let unit = self
                .dwarf
                .unit(header)
                .map_err(|err| map_dwarf_error("parsing type unit", err))?;
            self.scan_unit(&unit)?;
        }

        Ok(self.finish())
    }

    fn scan_unit(&mut self, unit: &Unit<OwnedReader>) -> SizeResult<()>
    {
        let mut scopes: Vec<(isize, Scope)> = Vec::new();
        let mut depth = 0isize;
        let mut cursor = unit.entries();
        while let Some((delta, entry)) = cursor.next_dfs().map_err(|err| map_dwarf_error("traversing DIE tree", err))? {
            depth += delta;
            while scopes.last().is_some_and(|(level, _)| *level >= depth) {
                scopes.pop();
            }
            let scope = self.visit(unit, entry, scopes.last().map(|(_, scope)| scope))?;
            if entry.has_children() {
                scopes.push((depth, scope));
            }
        }

        if let UnitType::Type {
            type_signature,
            type_offset,
        }
        | UnitType::SplitType {
            type_signature,
            type_offset,
        } = unit.header.type_()
        {
            let target = TypeRef::Offset(type_offset.to_unit_section_offset(unit));
            if let Some(index) = self.raw_index.get(&target).copied() {
                self.raw_index.insert(TypeRef::Signature(type_signature.0), index);
            }
        }
        Ok(())
    }

    fn visit(
        &mut self,
        unit: &Unit<OwnedReader>,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
        parent: Option<&Scope>,
    ) -> SizeResult<Scope>
    {
        let scope = match entry.tag() {
            constants::DW_TAG_compile_unit | constants::DW_TAG_type_unit | constants::DW_TAG_partial_unit => Scope::Unit,
            constants::DW_TAG_namespace => {
                let name = self
                    .entry_name(unit, entry)?
                    .unwrap_or_else(|| ANONYMOUS_NAMESPACE.to_string());
                Scope::Namespace(qualify(parent, &name))
            }
            tag @ (constants::DW_TAG_structure_type | constants::DW_TAG_class_type | constants::DW_TAG_union_type) => {
                let name = self.entry_name(unit, entry)?.map(|name| qualify(parent, &name));
                let kind = RawKind::Named {
                    size: self.udata(entry, constants::DW_AT_byte_size)?,
                    declaration: self.flag(entry, constants::DW_AT_declaration)?,
                    fields: Vec::new(),
                    template_args: Vec::new(),
                };
                let raw = self.push_type(unit, entry, name.clone(), kind);
                Scope::Record {
                    raw,
                    name: name.unwrap_or_default(),
                    union: tag == constants::DW_TAG_union_type,
                }
            }
            tag @ (constants::DW_TAG_enumeration_type | constants::DW_TAG_base_type | constants::DW_TAG_unspecified_type) => {
                let name = self.entry_name(unit, entry)?;
                let name = match tag {
                    constants::DW_TAG_enumeration_type => name.map(|name| qualify(parent, &name)),
                    _ => name,
                };
                let kind = RawKind::Named {
                    size: self.udata(entry, constants::DW_AT_byte_size)?,
                    declaration: self.flag(entry, constants::DW_AT_declaration)?,
                    fields: Vec::new(),
                    template_args: Vec::new(),
                };
                self.push_type(unit, entry, name, kind);
                Scope::Other
            }
            constants::DW_TAG_pointer_type | constants::DW_TAG_reference_type | constants::DW_TAG_rvalue_reference_type => {
                let pointee = self.type_ref(unit, entry, constants::DW_AT_type)?;
                self.push_type(unit, entry, None, RawKind::Pointer(pointee));
                Scope::Other
            }
            constants::DW_TAG_typedef => {
                let name = self.entry_name(unit, entry)?.map(|name| qualify(parent, &name));
                let target = self.type_ref(unit, entry, constants::DW_AT_type)?;
                self.push_type(unit, entry, name, RawKind::Alias(target));
                Scope::Other
            }
            constants::DW_TAG_const_type
            | constants::DW_TAG_volatile_type
            | constants::DW_TAG_restrict_type
            | constants::DW_TAG_atomic_type => {
                let target = self.type_ref(unit, entry, constants::DW_AT_type)?;
                self.push_type(unit, entry, None, RawKind::Alias(target));
                Scope::Other
            }
            constants::DW_TAG_array_type => {
                let element = self.type_ref(unit, entry, constants::DW_AT_type)?;
                Scope::Array(self.push_type(unit, entry, None, RawKind::Array { element, count: None }))
            }
            constants::DW_TAG_subrange_type => {
                if let Some(Scope::Array(raw)) = parent {
                    let extent = self.subrange_count(entry)?;
                    if let RawKind::Array { count, .. } = &mut self.raw[*raw].kind {
                        *count = Some(count.unwrap_or(1).saturating_mul(extent));
                    }
                }
                Scope::Other
            }
            constants::DW_TAG_member => {
                if let Some(Scope::Record { raw, union, .. }) = parent {
                    let field = self.member_field(unit, entry, *union)?;
                    self.push_field(*raw, field);
                }
                Scope::Other
            }
            constants::DW_TAG_inheritance => {
                if let Some(Scope::Record { raw, .. }) = parent {
                    let field = RawField {
                        name: String::new(),
                        ty: self.type_ref(unit, entry, constants::DW_AT_type)?,
                        offset: self.member_offset(entry)?.or(Some(0)),
                        is_base_class: true,
                    };
                    self.push_field(*raw, field);
                }
                Scope::Other
            }
            constants::DW_TAG_template_type_parameter => {
                if let (Some(Scope::Record { raw, .. }), Some(arg)) =
                    (parent, self.type_ref(unit, entry, constants::DW_AT_type)?)
                {
                    if let RawKind::Named { template_args, .. } = &mut self.raw[*raw].kind {
                        template_args.push(arg);
                    }
                }
                Scope::Other
            }
            constants::DW_TAG_variable => {
                self.visit_variable(unit, entry, parent)?;
                Scope::Other
            }
            _ => Scope::Other,
        };
        Ok(scope)
    }

    fn visit_variable(
        &mut self,
        unit: &Unit<OwnedReader>,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
        parent: Option<&Scope>,
    ) -> SizeResult<()>
    {
        let name = self.entry_name(unit, entry)?;
        let ty = self.type_ref(unit, entry, constants::DW_AT_type)?;

        // DWARF 5 spells in-class static data members as variables.
        if let (Some(Scope::Record { raw, .. }), Some(name)) = (parent, name.as_ref()) {
            let field = RawField {
                name: name.clone(),
                ty,
                offset: None,
                is_base_class: false,
            };
            self.push_field(*raw, field);
        }

        let variable = RawVariable {
            name: name.map(|name| qualify(parent, &name)),
            ty,
            specification: self.type_ref(unit, entry, constants::DW_AT_specification)?,
            address: self.variable_address(unit, entry)?,
            top_level: matches!(parent, Some(Scope::Unit | Scope::Namespace(_))),
        };
        let key = TypeRef::Offset(entry.offset().to_unit_section_offset(unit));
        self.variable_index.insert(key, self.variables.len());
        self.variables.push(variable);
        Ok(())
    }

    fn member_field(
        &self,
        unit: &Unit<OwnedReader>,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
        union: bool,
    ) -> SizeResult<RawField>
    {
        let is_static = self.flag(entry, constants::DW_AT_declaration)? || self.flag(entry, constants::DW_AT_external)?;
        let offset = match (is_static, self.member_offset(entry)?) {
            (true, _) => None,
            (false, Some(offset)) => Some(offset),
            (false, None) if union => Some(0),
            (false, None) => None,
        };
        Ok(RawField {
            name: self.entry_name(unit, entry)?.unwrap_or_default(),
            ty: self.type_ref(unit, entry, constants::DW_AT_type)?,
            offset,
            is_base_class: false,
        })
    }

    fn push_type(
        &mut self,
        unit: &Unit<OwnedReader>,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
        name: Option<String>,
        kind: RawKind,
    ) -> usize
    {
        let index = self.raw.len();
        self.raw.push(RawType { name, kind });
        self.raw_index
            .insert(TypeRef::Offset(entry.offset().to_unit_section_offset(unit)), index);
        index
    }

    fn push_field(&mut self, raw: usize, field: RawField)
    {
        if let RawKind::Named { fields, .. } = &mut self.raw[raw].kind {
            fields.push(field);
        }
    }

    fn member_offset(&self, entry: &DebuggingInformationEntry<'_, '_, OwnedReader>) -> SizeResult<Option<u64>>
    {
        if let Some(attr) = entry
            .attr(constants::DW_AT_data_member_location)
            .map_err(|err| map_dwarf_error("reading DW_AT_data_member_location", err))?
        {
            if let AttributeValue::Exprloc(expression) = attr.value() {
                // Pre-DWARF 4 producers encode constant offsets as
                // `DW_OP_plus_uconst <offset>`.
                let mut reader = expression.0;
                let op = reader
                    .read_u8()
                    .map_err(|err| map_dwarf_error("reading member location", err))?;
                if op == constants::DW_OP_plus_uconst.0 {
                    let offset = reader
                        .read_uleb128()
                        .map_err(|err| map_dwarf_error("reading member location", err))?;
                    return Ok(Some(offset));
                }
                return Ok(None);
            }
            return Ok(attr.udata_value());
        }

        if let Some(attr) = entry
            .attr(constants::DW_AT_data_bit_offset)
            .map_err(|err| map_dwarf_error("reading DW_AT_data_bit_offset", err))?
        {
            return Ok(attr.udata_value().map(|bits| bits / 8));
        }

        Ok(None)
    }

    fn subrange_count(&self, entry: &DebuggingInformationEntry<'_, '_, OwnedReader>) -> SizeResult<u64>
    {
        if let Some(count) = self.udata(entry, constants::DW_AT_count)? {
            return Ok(count);
        }
        let upper = entry
            .attr(constants::DW_AT_upper_bound)
            .map_err(|err| map_dwarf_error("reading DW_AT_upper_bound", err))?;
        // A missing or negative upper bound is a flexible array member.
        Ok(match upper.map(|attr| attr.value()) {
            Some(AttributeValue::Sdata(bound)) => u64::try_from(bound).map_or(0, |bound| bound + 1),
            Some(value) => value.udata_value().map_or(0, |bound| bound.saturating_add(1)),
            None => 0,
        })
    }

    fn variable_address(
        &self,
        unit: &Unit<OwnedReader>,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
    ) -> SizeResult<Option<u64>>
    {
        let Some(attr) = entry
            .attr(constants::DW_AT_location)
            .map_err(|err| map_dwarf_error("reading DW_AT_location", err))?
        else {
            return Ok(None);
        };
        let AttributeValue::Exprloc(expression) = attr.value() else {
            return Ok(None);
        };

        let mut reader = expression.0;
        let op = reader
            .read_u8()
            .map_err(|err| map_dwarf_error("reading variable location", err))?;
        let address = if op == constants::DW_OP_addr.0 {
            reader
                .read_address(unit.encoding().address_size)
                .map_err(|err| map_dwarf_error("reading DW_OP_addr", err))?
        } else if op == constants::DW_OP_addrx.0 || op == constants::DW_OP_GNU_addr_index.0 {
            let index = reader
                .read_uleb128()
                .map_err(|err| map_dwarf_error("reading DW_OP_addrx", err))?;
            let Ok(index) = usize::try_from(index) else {
                return Ok(None);
            };
            self.dwarf
                .address(unit, gimli::DebugAddrIndex(index))
                .map_err(|err| map_dwarf_error("resolving DW_OP_addrx", err))?
        } else {
            return Ok(None);
        };

        // Anything after the address (thread-local offsets, arithmetic) means
        // the object does not live at a fixed address.
        Ok(reader.is_empty().then_some(address))
    }

    fn type_ref(
        &self,
        unit: &Unit<OwnedReader>,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
        name: DwAt,
    ) -> SizeResult<Option<TypeRef>>
    {
        let Some(attr) = entry
            .attr(name)
            .map_err(|err| map_dwarf_error("reading type reference", err))?
        else {
            return Ok(None);
        };
        Ok(match attr.value() {
            AttributeValue::UnitRef(offset) => Some(TypeRef::Offset(offset.to_unit_section_offset(unit))),
            AttributeValue::DebugInfoRef(offset) => Some(TypeRef::Offset(UnitSectionOffset::from(offset))),
            AttributeValue::DebugTypesRef(signature) => Some(TypeRef::Signature(signature.0)),
            _ => None,
        })
    }

    fn udata(&self, entry: &DebuggingInformationEntry<'_, '_, OwnedReader>, name: DwAt) -> SizeResult<Option<u64>>
    {
        Ok(entry
            .attr(name)
            .map_err(|err| map_dwarf_error("reading attribute", err))?
            .and_then(|attr| attr.udata_value()))
    }

    fn flag(&self, entry: &DebuggingInformationEntry<'_, '_, OwnedReader>, name: DwAt) -> SizeResult<bool>
    {
        Ok(matches!(
            entry
                .attr(name)
                .map_err(|err| map_dwarf_error("reading flag", err))?
                .map(|attr| attr.value()),
            Some(AttributeValue::Flag(true))
        ))
    }

    fn entry_name(
        &self,
        unit: &Unit<OwnedReader>,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
    ) -> SizeResult<Option<String>>
    {
        let Some(attr) = entry
            .attr(constants::DW_AT_name)
            .map_err(|err| map_dwarf_error("reading DW_AT_name", err))?
        else {
            return Ok(None);
        };
        let reader = self
            .dwarf
            .attr_string(unit, attr.value())
            .map_err(|err| map_dwarf_error("resolving DWARF string", err))?;
        let owned = match reader.to_string() {
            Ok(cow) => cow.into_owned(),
            Err(_) => reader
                .to_string_lossy()
                .map_err(|err| map_dwarf_error("decoding DWARF string", err))?
                .into_owned(),
        };
        Ok(Some(owned))
    }

    fn finish(self) -> CatalogTables
    {
        Resolver::new(&self).tables()
    }
}

/// Second step: turn raw entries into type ids and [`TypeInfo`]s.
struct Resolver<'b>
{
    raw: &'b [RawType],
    raw_index: &'b HashMap<TypeRef, usize>,
    variables: &'b [RawVariable],
    variable_index: &'b HashMap<TypeRef, usize>,
    pointer_width: u64,
    definitions: HashMap<&'b str, usize>,
    ids: HashMap<usize, TypeId>,
}

/// The catalog always has `void` first.
const VOID: TypeId = TypeId::from_raw(0);

impl<'b> Resolver<'b>
{
    fn new(builder: &'b CatalogBuilder<'_>) -> Self
    {
        let mut definitions = HashMap::new();
        for (index, raw) in builder.raw.iter().enumerate() {
            if let (Some(name), RawKind::Named { declaration: false, .. }) = (raw.name.as_deref(), &raw.kind) {
                definitions.entry(name).or_insert(index);
            }
        }
        Self {
            raw: &builder.raw,
            raw_index: &builder.raw_index,
            variables: &builder.variables,
            variable_index: &builder.variable_index,
            pointer_width: builder.pointer_width,
            definitions,
            ids: HashMap::new(),
        }
    }

    /// Raw entry a reference finally denotes; `None` is `void`.
    fn canonical(&self, reference: Option<TypeRef>) -> Option<usize>
    {
        self.canonical_index(*self.raw_index.get(&reference?)?)
    }

    fn canonical_index(&self, mut index: usize) -> Option<usize>
    {
        for _ in 0..MAX_TYPE_REF_DEPTH {
            match &self.raw[index].kind {
                RawKind::Alias(target) => index = *self.raw_index.get(&(*target)?)?,
                RawKind::Named { declaration: true, .. } => {
                    let name = self.raw[index].name.as_deref()?;
                    return Some(self.definitions.get(name).copied().unwrap_or(index));
                }
                _ => return Some(index),
            }
        }
        None
    }

    fn id(&self, reference: Option<TypeRef>) -> TypeId
    {
        self.canonical(reference)
            .and_then(|index| self.ids.get(&index).copied())
            .unwrap_or(VOID)
    }

    fn name_of(&self, index: usize, depth: usize) -> String
    {
        if depth > MAX_TYPE_REF_DEPTH {
            return "?".to_string();
        }
        let raw = &self.raw[index];
        match &raw.kind {
            RawKind::Named { .. } | RawKind::Alias(_) => raw.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
            RawKind::Pointer(pointee) => match self.canonical(*pointee) {
                Some(pointee) => format!("{}*", self.name_of(pointee, depth + 1)),
                None => "void*".to_string(),
            },
            RawKind::Array { element, count } => {
                let element = self
                    .canonical(*element)
                    .map_or_else(|| "void".to_string(), |element| self.name_of(element, depth + 1));
                match count {
                    Some(count) => format!("{element}[{count}]"),
                    None => format!("{element}[]"),
                }
            }
        }
    }

    fn size_of(&self, index: usize, depth: usize) -> u64
    {
        if depth > MAX_TYPE_REF_DEPTH {
            return 0;
        }
        match &self.raw[index].kind {
            RawKind::Named { size, .. } => size.unwrap_or(0),
            RawKind::Pointer(_) => self.pointer_width,
            RawKind::Array { element, count } => {
                let element = self.canonical(*element).map_or(0, |element| self.size_of(element, depth + 1));
                element.saturating_mul(count.unwrap_or(0))
            }
            RawKind::Alias(_) => 0,
        }
    }

    fn tables(mut self) -> CatalogTables
    {
        let mut tables = CatalogTables::default();
        tables.types.push(TypeInfo::new("void", 0));
        tables.names.insert("void".to_string(), VOID);

        // Ids first: type infos refer to each other through them.
        let canonical: Vec<usize> = (0..self.raw.len())
            .filter(|index| self.canonical_index(*index) == Some(*index))
            .collect();
        for (position, index) in canonical.iter().enumerate() {
            self.ids.insert(*index, TypeId::from_raw(position as u64 + 1));
        }

        for index in &canonical {
            let info = self.type_info(*index);
            let id = TypeId::from_raw(tables.types.len() as u64);
            tables.names.entry(info.name.clone()).or_insert(id);
            tables
                .short_names
                .entry(short_name(&info.name).to_string())
                .or_insert(id);
            tables.types.push(info);
        }

        // Typedef names resolve to what they stand for.
        for raw in self.raw {
            if let (Some(name), RawKind::Alias(target)) = (raw.name.as_ref(), &raw.kind) {
                if target.is_none() || self.canonical(*target).is_some() {
                    tables.names.entry(name.clone()).or_insert_with(|| self.id(*target));
                }
            }
        }

        for variable in self.variables {
            let Some(address) = variable.address else {
                continue;
            };
            if !variable.top_level && variable.specification.is_none() {
                continue;
            }
            let Some((name, ty)) = self.variable_identity(variable) else {
                continue;
            };
            let global = GlobalVariable {
                address,
                ty: self.id(ty),
            };
            tables.globals.entry(short_name(&name).to_string()).or_insert(global);
            tables.globals.entry(name).or_insert(global);
        }

        debug!(
            types = tables.types.len(),
            globals = tables.globals.len(),
            "resolved DWARF type catalog"
        );
        tables
    }

    /// Name and type of a variable, following `DW_AT_specification` to the
    /// in-class declaration of out-of-line definitions.
    fn variable_identity(&self, variable: &RawVariable) -> Option<(String, Option<TypeRef>)>
    {
        let mut name = variable.name.clone();
        let mut ty = variable.ty;
        let mut specification = variable.specification;
        for _ in 0..MAX_TYPE_REF_DEPTH {
            let Some(target) = specification else {
                break;
            };
            let declaration = &self.variables[*self.variable_index.get(&target)?];
            name = declaration.name.clone().or(name);
            ty = ty.or(declaration.ty);
            specification = declaration.specification;
        }
        Some((name?, ty))
    }

    fn type_info(&self, index: usize) -> TypeInfo
    {
        let name = self.name_of(index, 0);
        match &self.raw[index].kind {
            RawKind::Pointer(pointee) => TypeInfo::pointer(name, self.pointer_width, self.id(*pointee)),
            RawKind::Named {
                size,
                fields,
                template_args,
                ..
            } => {
                let mut info = TypeInfo::new(name, size.unwrap_or(0))
                    .with_template_args(template_args.iter().map(|arg| self.id(Some(*arg))));
                for field in fields {
                    let ty = self.id(field.ty);
                    info = info.with_field(match (field.is_base_class, field.offset) {
                        (true, Some(offset)) => Field::base(ty, offset),
                        (false, Some(offset)) => Field::member(field.name.clone(), ty, offset),
                        (_, None) => Field::static_member(field.name.clone(), ty),
                    });
                }
                info
            }
            RawKind::Array { .. } | RawKind::Alias(_) => TypeInfo::new(name, self.size_of(index, 0)),
        }
    }
}
