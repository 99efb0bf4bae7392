//! # Symbols
//!
//! Static type and variable information read from an image's DWARF.
//!
//! [`DwarfCatalog`] loads every type the image describes up front and answers
//! the metadata half of [`crate::Inspector`]: type lookup by name, type
//! layouts, and the link-time address of global variables. Memory access is
//! left to the backend that owns the catalog.
//!
//! ## Name lookup
//!
//! Names are matched the way a debugger prints them: exact qualified name
//! first (`std::vector<int, std::allocator<int> >`), then without a leading
//! `::`, then by unqualified name (`CMasternode` for `ns::CMasternode`).

pub mod extractor;
pub mod image;

use std::path::Path;

use gimli::{Dwarf, EndianArcSlice, RunTimeEndian};
use tracing::{info, warn};

pub use extractor::GlobalVariable;
use extractor::{CatalogBuilder, CatalogTables};
pub use image::BinaryImage;

use crate::error::{SizeError, SizeResult};
use crate::types::{TypeId, TypeInfo};

pub(crate) type OwnedReader = EndianArcSlice<RunTimeEndian>;
pub(crate) type OwnedDwarf = Dwarf<OwnedReader>;

/// Wrap a gimli error with what was being done when it happened.
pub(crate) fn map_dwarf_error(context: &str, err: gimli::Error) -> SizeError
{
    SizeError::Dwarf {
        context: context.to_string(),
        details: err.to_string(),
    }
}

/// Types and globals of one image.
pub struct DwarfCatalog
{
    image: BinaryImage,
    tables: CatalogTables,
}

impl DwarfCatalog
{
    /// Load the image at `path` and index its debug information.
    ///
    /// ## Errors
    ///
    /// - `Io`: the file cannot be read
    /// - `Dwarf`: the file or its debug sections cannot be parsed
    pub fn load(path: impl AsRef<Path>) -> SizeResult<Self>
    {
        Self::from_image(BinaryImage::open(path)?)
    }

    /// Index an already parsed image.
    ///
    /// ## Errors
    ///
    /// - `Dwarf`: a debug section cannot be parsed
    pub fn from_image(image: BinaryImage) -> SizeResult<Self>
    {
        if !image.has_debug_info() {
            warn!(path = %image.path().display(), "image has no .debug_info; only void is known");
        }
        let tables = CatalogBuilder::new(image.dwarf()?, image.pointer_width()).build()?;
        info!(
            path = %image.path().display(),
            types = tables.types.len(),
            globals = tables.globals.len(),
            "loaded type catalog"
        );
        Ok(Self { image, tables })
    }

    /// Image the catalog was built from.
    pub fn image(&self) -> &BinaryImage
    {
        &self.image
    }

    /// Address size of the image in bytes.
    pub fn pointer_width(&self) -> u64
    {
        self.image.pointer_width()
    }

    pub fn little_endian(&self) -> bool
    {
        self.image.little_endian()
    }

    /// Number of distinct types, `void` included.
    pub fn type_count(&self) -> usize
    {
        self.tables.types.len()
    }

    /// Find a type by name.
    ///
    /// ## Errors
    ///
    /// - `UnresolvedSymbol`: no type has this name
    pub fn lookup_type(&self, name: &str) -> SizeResult<TypeId>
    {
        let name = name.trim();
        let unrooted = name.strip_prefix("::").unwrap_or(name);
        self.tables
            .names
            .get(name)
            .or_else(|| self.tables.names.get(unrooted))
            .or_else(|| self.tables.short_names.get(unrooted))
            .copied()
            .ok_or_else(|| SizeError::UnresolvedSymbol(format!("type {name}")))
    }

    /// Layout of a type this catalog issued.
    pub fn type_info(&self, ty: TypeId) -> SizeResult<&TypeInfo>
    {
        usize::try_from(ty.raw())
            .ok()
            .and_then(|index| self.tables.types.get(index))
            .ok_or_else(|| SizeError::UnresolvedSymbol(format!("{ty} is not in this catalog")))
    }

    /// Link-time address and type of a global variable.
    ///
    /// ## Errors
    ///
    /// - `UnresolvedSymbol`: no global with a static address has this name
    pub fn global(&self, name: &str) -> SizeResult<GlobalVariable>
    {
        let name = name.trim();
        let unrooted = name.strip_prefix("::").unwrap_or(name);
        self.tables
            .globals
            .get(name)
            .or_else(|| self.tables.globals.get(unrooted))
            .or_else(|| self.tables.globals.get(extractor::short_name(unrooted)))
            .copied()
            .ok_or_else(|| SizeError::UnresolvedSymbol(name.to_string()))
    }
}
