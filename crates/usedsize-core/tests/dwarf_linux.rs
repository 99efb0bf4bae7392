//! DWARF catalog and live-process backend, run against this test binary.
//!
//! Skipped when the binary was built without debug information.

#![cfg(target_os = "linux")]

use std::hint::black_box;

use usedsize_core::symbols::DwarfCatalog;
use usedsize_core::types::ProcessId;
use usedsize_core::{Inspector, ProcessInspector, ResolverConfig, SizeError, SizeResolver};

#[repr(C)]
#[allow(dead_code)]
struct SmokePair
{
    tag: u32,
    value: u64,
}

#[used]
static SMOKE_COUNTER: u64 = 0x5eed_cafe;

#[used]
static SMOKE_PAIR: SmokePair = SmokePair { tag: 7, value: 42 };

fn catalog() -> Option<DwarfCatalog>
{
    black_box(&SMOKE_COUNTER);
    black_box(&SMOKE_PAIR);
    let exe = std::env::current_exe().unwrap();
    let catalog = DwarfCatalog::load(&exe).unwrap();
    if !catalog.image().has_debug_info() {
        eprintln!("skipping: {} has no debug information", exe.display());
        return None;
    }
    Some(catalog)
}

#[test]
fn test_base_types_are_catalogued()
{
    let Some(catalog) = catalog() else {
        return;
    };
    assert_eq!(catalog.pointer_width(), 8);
    assert!(catalog.type_count() > 1);

    let u64_type = catalog.lookup_type("u64").unwrap();
    assert_eq!(catalog.type_info(u64_type).unwrap().byte_size, 8);
    assert!(matches!(
        catalog.lookup_type("NoSuchTypeAnywhere").unwrap_err(),
        SizeError::UnresolvedSymbol(_)
    ));
}

#[test]
fn test_struct_members_are_catalogued()
{
    let Some(catalog) = catalog() else {
        return;
    };
    let pair = catalog.lookup_type("SmokePair").unwrap();
    let info = catalog.type_info(pair).unwrap();
    assert_eq!(info.byte_size, 16);

    let offsets: Vec<(&str, Option<u64>)> = info
        .fields
        .iter()
        .map(|field| (field.name.as_str(), field.offset))
        .collect();
    assert_eq!(offsets, [("tag", Some(0)), ("value", Some(8))]);
}

#[test]
fn test_globals_resolve_by_short_name()
{
    let Some(catalog) = catalog() else {
        return;
    };
    let global = catalog.global("SMOKE_COUNTER").unwrap();
    assert_eq!(catalog.type_info(global.ty).unwrap().name, "u64");
    assert!(catalog.global("SMOKE_NOT_A_GLOBAL").is_err());
}

#[test]
fn test_attach_to_self_reads_globals()
{
    if catalog().is_none() {
        return;
    }
    let inspector = ProcessInspector::attach(ProcessId(std::process::id())).unwrap();

    let counter = inspector.resolve("SMOKE_COUNTER").unwrap();
    assert_eq!(counter.address.value(), std::ptr::addr_of!(SMOKE_COUNTER) as u64);
    assert_eq!(inspector.read_unsigned(counter.address, 8).unwrap(), 0x5eed_cafe);

    let value = inspector.resolve("SMOKE_PAIR.value").unwrap();
    assert_eq!(inspector.read_unsigned(value.address, 8).unwrap(), 42);

    let resolver = SizeResolver::new(&inspector, ResolverConfig::default());
    assert_eq!(resolver.size_of("SMOKE_PAIR").unwrap(), 16);
}
