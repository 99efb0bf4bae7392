//! Tests for backend-agnostic types

use std::path::PathBuf;

use usedsize_core::types::{Address, Field, MemoryRegion, ObjectRef, ProcessId, TypeId, TypeInfo};

fn region(start: u64, end: u64, permissions: &str) -> MemoryRegion
{
    MemoryRegion {
        start: Address::from(start),
        end: Address::from(end),
        permissions: permissions.to_string(),
        file_offset: 0,
        path: Some(PathBuf::from("[heap]")),
    }
}

#[test]
fn test_process_id_conversions()
{
    let pid = ProcessId::from(12345);
    assert_eq!(pid.0, 12345);
    let value: u32 = pid.into();
    assert_eq!(value, 12345);
    assert_eq!(pid, ProcessId(12345));
    assert_ne!(pid, ProcessId(54321));
}

#[test]
fn test_memory_region_size()
{
    assert_eq!(region(0x1000, 0x2000, "rw-p").size(), 0x1000);
    // end <= start saturates to 0
    assert_eq!(region(0x2000, 0x1000, "rw-p").size(), 0);
    assert_eq!(region(0x1000, 0x1000, "rw-p").size(), 0);
}

#[test]
fn test_memory_region_contains_is_half_open()
{
    let heap = region(0x1000, 0x2000, "rw-p");
    assert!(heap.contains(Address::from(0x1000)));
    assert!(heap.contains(Address::from(0x1fff)));
    assert!(!heap.contains(Address::from(0x2000)));
    assert!(!heap.contains(Address::from(0xfff)));
}

#[test]
fn test_memory_region_is_readable()
{
    assert!(region(0x1000, 0x2000, "r-xp").is_readable());
    assert!(!region(0x1000, 0x2000, "---p").is_readable());
}

#[test]
fn test_address_arithmetic()
{
    let start = Address::from(0x1000);
    assert_eq!(start + 0x10, Address::from(0x1010));
    assert_eq!(Address::from(0x1010).distance_from(start), Some(0x10));
    assert_eq!(start.distance_from(Address::from(0x1010)), None);
    // Wrapping add: corrupt pointers must not panic.
    assert_eq!(Address::from(u64::MAX) + 2, Address::from(1));
    assert_eq!(Address::from(0x1000).to_string(), "0x0000000000001000");
}

#[test]
fn test_field_kinds()
{
    let ty = TypeId::from_raw(3);
    let member = Field::member("count", ty, 8);
    let base = Field::base(ty, 0);
    let shared = Field::static_member("instances", ty);

    assert_eq!(member.offset, Some(8));
    assert!(!member.is_base_class);
    assert!(base.is_base_class);
    assert!(base.name.is_empty());
    assert!(shared.is_static());
    assert!(!member.is_static());
}

#[test]
fn test_type_info_builders()
{
    let element = TypeId::from_raw(1);
    let info = TypeInfo::new("std::vector<int, std::allocator<int> >", 24)
        .with_template_args([element])
        .with_field(Field::member("_M_start", TypeId::from_raw(2), 0));

    assert_eq!(info.template_args.as_slice(), &[element]);
    assert_eq!(info.fields.len(), 1);
    assert!(!info.is_pointer());
    assert!(TypeInfo::pointer("int*", 8, element).is_pointer());
}

#[test]
fn test_object_ref_children_keep_the_path()
{
    let object = ObjectRef::new("mnodeman", Address::from(0x5000), TypeId::from_raw(7));
    let child = object.child(".mapMasternodes", 0x28, TypeId::from_raw(9));

    assert_eq!(child.name, "mnodeman.mapMasternodes");
    assert_eq!(child.address, Address::from(0x5028));
    assert_eq!(object.viewed_as(TypeId::from_raw(9)).address, object.address);
    assert_eq!(child.to_string(), "mnodeman.mapMasternodes @ 0x0000000000005028");
}
