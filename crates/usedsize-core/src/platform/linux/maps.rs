//! `/proc/<pid>/maps` parsing and load bias computation.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use tracing::trace;

use crate::error::SizeResult;
use crate::types::{Address, MemoryRegion, ProcessId};

static SYSTEM_PAGE_SIZE: Lazy<u64> = Lazy::new(|| {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    u64::try_from(size).ok().filter(|size| *size > 0).unwrap_or(4096)
});

fn page_align_down(value: u64, page_size: u64) -> u64
{
    value & !(page_size - 1)
}

/// Parse the text of a maps file. Lines that do not parse are skipped.
pub fn parse_maps(text: &str) -> Vec<MemoryRegion>
{
    text.lines()
        .filter_map(|line| {
            let region = parse_line(line);
            if region.is_none() {
                trace!(line, "skipping unparsable maps line");
            }
            region
        })
        .collect()
}

fn parse_line(line: &str) -> Option<MemoryRegion>
{
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return None;
    }
    let (start, end) = fields[0].split_once('-')?;
    let path = (fields.len() > 5).then(|| PathBuf::from(fields[5..].join(" ")));
    Some(MemoryRegion {
        start: Address::from(u64::from_str_radix(start, 16).ok()?),
        end: Address::from(u64::from_str_radix(end, 16).ok()?),
        permissions: fields[1].to_string(),
        file_offset: u64::from_str_radix(fields[2], 16).ok()?,
        path,
    })
}

/// Current mappings of a process.
pub fn read_maps(pid: ProcessId) -> SizeResult<Vec<MemoryRegion>>
{
    let text = fs::read_to_string(format!("/proc/{pid}/maps"))?;
    Ok(parse_maps(&text))
}

/// Difference between where `image` is mapped and where it was linked.
///
/// The first mapping of the image's file at offset 0 corresponds to its
/// lowest segment, `link_base`. `None` if the image is not mapped.
pub fn load_bias(regions: &[MemoryRegion], image: &Path, link_base: u64) -> Option<u64>
{
    let mapped = regions
        .iter()
        .find(|region| region.file_offset == 0 && region.path.as_deref() == Some(image))?;
    Some(
        mapped
            .start
            .value()
            .wrapping_sub(page_align_down(link_base, *SYSTEM_PAGE_SIZE)),
    )
}
