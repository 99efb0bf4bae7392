//! Binary image parsing and DWARF section loading.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gimli::{Dwarf, EndianArcSlice, RunTimeEndian, SectionId};
use object::{Object, ObjectSection, ObjectSegment};
use once_cell::sync::OnceCell;

use super::{map_dwarf_error, OwnedDwarf, OwnedReader};
use crate::error::{SizeError, SizeResult};

/// Sections read from the image; ELF and Mach-O spellings.
const DWARF_SECTIONS: &[(&str, &[&str])] = &[
    (".debug_abbrev", &[".debug_abbrev", "__debug_abbrev"]),
    (".debug_addr", &[".debug_addr", "__debug_addr"]),
    (".debug_info", &[".debug_info", "__debug_info"]),
    (".debug_line", &[".debug_line", "__debug_line"]),
    (".debug_line_str", &[".debug_line_str", "__debug_line_str"]),
    (".debug_ranges", &[".debug_ranges", "__debug_ranges"]),
    (".debug_rnglists", &[".debug_rnglists", "__debug_rnglists"]),
    (".debug_str", &[".debug_str", "__debug_str"]),
    (".debug_str_offsets", &[".debug_str_offsets", "__debug_str_offsets"]),
    (".debug_types", &[".debug_types", "__debug_types"]),
    (".debug_loc", &[".debug_loc", "__debug_loc"]),
    (".debug_loclists", &[".debug_loclists", "__debug_loclists"]),
];

fn load_section_bytes(file: &object::File<'_>, names: &[&str]) -> SizeResult<Arc<[u8]>>
{
    for name in names {
        if let Some(section) = file.section_by_name(name) {
            let data = section.uncompressed_data().map_err(|err| SizeError::Dwarf {
                context: format!("reading {name}"),
                details: err.to_string(),
            })?;
            return Ok(match data {
                Cow::Borrowed(bytes) => Arc::<[u8]>::from(bytes.to_vec()),
                Cow::Owned(vec) => vec.into(),
            });
        }
    }

    Ok(Arc::<[u8]>::from(Vec::new()))
}

/// An executable or shared object with its debug sections in memory.
pub struct BinaryImage
{
    path: PathBuf,
    endian: RunTimeEndian,
    pointer_width: u64,
    link_base: u64,
    debug_sections: HashMap<&'static str, Arc<[u8]>>,
    dwarf_cache: OnceCell<OwnedDwarf>,
}

impl BinaryImage
{
    /// Read and parse the image at `path`.
    ///
    /// ## Errors
    ///
    /// - `Io`: the file cannot be read
    /// - `Dwarf`: the file is not an object file this build understands
    pub fn open(path: impl AsRef<Path>) -> SizeResult<Self>
    {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Self::parse(path.to_path_buf(), &bytes)
    }

    /// Parse an image already in memory; `path` is only used in messages.
    ///
    /// ## Errors
    ///
    /// - `Dwarf`: the bytes are not an object file, or a debug section cannot
    ///   be decompressed
    pub fn parse(path: PathBuf, bytes: &[u8]) -> SizeResult<Self>
    {
        let file = object::File::parse(bytes).map_err(|err| SizeError::Dwarf {
            context: format!("parsing {}", path.display()),
            details: err.to_string(),
        })?;

        let endian = if file.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };
        let pointer_width = if file.is_64() { 8 } else { 4 };

        // Lowest page-aligned segment address; the load bias is measured from it.
        let link_base = file
            .segments()
            .filter(|segment| segment.size() > 0)
            .map(|segment| segment.address() & !0xfff)
            .min()
            .unwrap_or(0);

        let mut debug_sections = HashMap::new();
        for (canonical, aliases) in DWARF_SECTIONS {
            debug_sections.insert(*canonical, load_section_bytes(&file, aliases)?);
        }

        Ok(Self {
            path,
            endian,
            pointer_width,
            link_base,
            debug_sections,
            dwarf_cache: OnceCell::new(),
        })
    }

    /// Path the image was read from.
    pub fn path(&self) -> &Path
    {
        &self.path
    }

    /// Address size in bytes: 8 for 64-bit images, 4 otherwise.
    pub fn pointer_width(&self) -> u64
    {
        self.pointer_width
    }

    /// Byte order of the image's target.
    pub fn little_endian(&self) -> bool
    {
        self.endian == RunTimeEndian::Little
    }

    /// Lowest segment address the image was linked at.
    pub fn link_base(&self) -> u64
    {
        self.link_base
    }

    /// Whether the image carries any `.debug_info`.
    pub fn has_debug_info(&self) -> bool
    {
        self.debug_sections.get(".debug_info").is_some_and(|data| !data.is_empty())
    }

    pub(crate) fn dwarf(&self) -> SizeResult<&OwnedDwarf>
    {
        self.dwarf_cache.get_or_try_init(|| {
            Dwarf::load(|section| Ok::<_, gimli::Error>(self.section_reader(section)))
                .map_err(|err| map_dwarf_error("loading DWARF sections", err))
        })
    }

    fn section_reader(&self, id: SectionId) -> OwnedReader
    {
        let key = match id {
            SectionId::DebugAbbrev => ".debug_abbrev",
            SectionId::DebugAddr => ".debug_addr",
            SectionId::DebugInfo => ".debug_info",
            SectionId::DebugLine => ".debug_line",
            SectionId::DebugLineStr => ".debug_line_str",
            SectionId::DebugRanges => ".debug_ranges",
            SectionId::DebugRngLists => ".debug_rnglists",
            SectionId::DebugStr => ".debug_str",
            SectionId::DebugStrOffsets => ".debug_str_offsets",
            SectionId::DebugTypes => ".debug_types",
            SectionId::DebugLoc => ".debug_loc",
            SectionId::DebugLocLists => ".debug_loclists",
            _ => "",
        };

        let data = self
            .debug_sections
            .get(key)
            .cloned()
            .unwrap_or_else(|| Arc::<[u8]>::from(Vec::new()));
        EndianArcSlice::new(data, self.endian)
    }
}
