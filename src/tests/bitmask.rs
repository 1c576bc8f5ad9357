// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

use std::sync::Arc;

use crate::tests::*;

fn access_level() -> Arc<EnumDescriptor> {
    test_registry().lookup_enum("AccessLevel").unwrap().clone()
}

#[test]
fn pack_ors_member_values() {
    let access = access_level();
    assert_eq!(access.pack([]).unwrap(), 0);
    assert_eq!(access.pack(["CurrentRead"]).unwrap(), 1);
    assert_eq!(access.pack(["CurrentRead", "HistoryWrite"]).unwrap(), 9);
    // Packing a member twice is idempotent.
    assert_eq!(access.pack(["CurrentRead", "CurrentRead"]).unwrap(), 1);
}

#[test]
fn pack_rejects_unknown_members() {
    let access = access_level();
    assert!(matches!(
        access.pack(["NoSuchFlag"]),
        Err(CodecError::UnknownEnumMember { .. })
    ));
}

#[test]
fn unpack_uses_superset_membership() {
    let access = access_level();
    let names = |mask: u32| -> Vec<&str> {
        access.unpack(mask).iter().map(|m| m.name.as_str()).collect()
    };
    assert_eq!(names(0), Vec::<&str>::new());
    assert_eq!(names(1), ["CurrentRead"]);
    // The composite member appears alongside its constituents.
    assert_eq!(names(3), ["CurrentRead", "CurrentWrite", "CurrentReadWrite"]);
    // Bits that match no member are ignored.
    assert_eq!(names(0x8000_0000), Vec::<&str>::new());
}

#[test]
fn packing_a_composite_implies_its_constituents() {
    let access = access_level();
    let set = EnumSet::from_names(access, ["CurrentReadWrite"]).unwrap();
    assert_eq!(set.mask(), 3);
    assert!(set.contains("CurrentRead"));
    assert!(set.contains("CurrentWrite"));
    assert!(set.contains("CurrentReadWrite"));
}

#[test]
fn insert_and_remove_adjust_the_mask() {
    let access = access_level();
    let mut set = EnumSet::from_mask(access, 0);
    assert!(set.is_empty());
    set.insert("HistoryRead").unwrap();
    assert_eq!(set.mask(), 4);
    set.insert("CurrentReadWrite").unwrap();
    assert_eq!(set.mask(), 7);
    set.remove("CurrentWrite").unwrap();
    assert_eq!(set.mask(), 5);
    // Removing the composite clears what is left of it.
    set.remove("CurrentReadWrite").unwrap();
    assert_eq!(set.mask(), 4);
    assert!(set.remove("Bogus").is_err());
}

#[test]
fn unknown_bits_survive_a_round_trip() {
    let access = access_level();
    let set = EnumSet::from_mask(access, 0x80f);
    // Unpacking sees only the known members but the mask keeps every bit.
    assert_eq!(set.members().len(), 5);
    assert_eq!(set.mask(), 0x80f);
}

#[test]
fn equality_ignores_descriptor_identity() {
    let a = EnumSet::from_mask(access_level(), 3);
    let b = EnumSet::from_mask(access_level(), 3);
    assert_eq!(a, b);
    assert_ne!(a, EnumSet::from_mask(access_level(), 1));
}
