// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

use crate::tests::*;

fn plain_type(name: &str, type_id: u32, binary_id: u32) -> TypeDescriptor {
    TypeDescriptor::new(
        name,
        NodeId::new(0, type_id),
        NodeId::new(0, binary_id),
        NodeId::null(),
    )
    .with_field(FieldDescriptor::new("Value", FieldKind::Int32))
}

#[test]
fn lookups_by_each_id() {
    let registry = test_registry();
    assert_eq!(
        registry.lookup_by_type_id(&read_value_id_type()).unwrap().name,
        "ReadValueId"
    );
    assert_eq!(
        registry
            .lookup_by_binary_id(&read_value_id_binary())
            .unwrap()
            .name,
        "ReadValueId"
    );
    assert_eq!(
        registry.lookup_by_xml_id(&read_value_id_xml()).unwrap().name,
        "ReadValueId"
    );
    assert!(matches!(
        registry.lookup_by_type_id(&NodeId::new(9, 9u32)),
        Err(CodecError::UnknownType(_))
    ));
}

#[test]
fn identical_re_registration_is_a_no_op() {
    let mut builder = TypeRegistryBuilder::new();
    builder.register_type(plain_type("A", 1, 2)).unwrap();
    builder.register_type(plain_type("A", 1, 2)).unwrap();
    let registry = builder.build().unwrap();
    assert_eq!(registry.type_count(), 1);
}

#[test]
fn conflicting_re_registration_fails() {
    let mut builder = TypeRegistryBuilder::new();
    builder.register_type(plain_type("A", 1, 2)).unwrap();
    let conflicting = plain_type("A", 1, 2)
        .with_field(FieldDescriptor::new("Extra", FieldKind::Boolean));
    assert!(matches!(
        builder.register_type(conflicting),
        Err(CodecError::DuplicateType(_))
    ));
}

#[test]
fn encoding_id_claimed_twice_fails_build() {
    let mut builder = TypeRegistryBuilder::new();
    builder.register_type(plain_type("A", 1, 2)).unwrap();
    // Different type id, same binary encoding id.
    builder.register_type(plain_type("B", 3, 2)).unwrap();
    assert!(matches!(
        builder.build(),
        Err(CodecError::DuplicateEncodingId(_))
    ));
}

#[test]
fn shared_binary_and_xml_id_fails_build() {
    let mut builder = TypeRegistryBuilder::new();
    // One type using the same node id for both encodings is just as
    // ambiguous as two types sharing an id.
    builder
        .register_type(
            TypeDescriptor::new("A", NodeId::new(0, 1u32), NodeId::new(0, 2u32), NodeId::new(0, 2u32))
                .with_field(FieldDescriptor::new("Value", FieldKind::Int32)),
        )
        .unwrap();
    assert!(matches!(
        builder.build(),
        Err(CodecError::DuplicateEncodingId(_))
    ));
}

#[test]
fn more_optional_fields_than_mask_bits_fails_build() {
    let mut descriptor = TypeDescriptor::new(
        "Wide",
        NodeId::new(0, 1u32),
        NodeId::new(0, 2u32),
        NodeId::null(),
    );
    for i in 0..33 {
        descriptor = descriptor.with_field(FieldDescriptor::optional(
            &format!("Field{}", i),
            FieldKind::UInt32,
        ));
    }
    let mut builder = TypeRegistryBuilder::new();
    builder.register_type(descriptor).unwrap();
    assert!(matches!(
        builder.build(),
        Err(CodecError::TooManyOptionalFields { count: 33, .. })
    ));
}

#[test]
fn missing_base_type_fails_build() {
    let mut builder = TypeRegistryBuilder::new();
    builder
        .register_type(plain_type("Derived", 1, 2).with_base(NodeId::new(0, 99u32)))
        .unwrap();
    assert!(matches!(
        builder.build(),
        Err(CodecError::MissingBaseType { .. })
    ));
}

#[test]
fn base_type_cycle_fails_build() {
    let mut builder = TypeRegistryBuilder::new();
    builder
        .register_type(plain_type("A", 1, 2).with_base(NodeId::new(0, 3u32)))
        .unwrap();
    builder
        .register_type(plain_type("B", 3, 4).with_base(NodeId::new(0, 1u32)))
        .unwrap();
    assert!(matches!(
        builder.build(),
        Err(CodecError::CyclicBaseType(_))
    ));
}

#[test]
fn unregistered_field_reference_fails_build() {
    let mut builder = TypeRegistryBuilder::new();
    builder
        .register_type(
            plain_type("A", 1, 2).with_field(FieldDescriptor::new(
                "Nested",
                FieldKind::Struct(NodeId::new(0, 50u32)),
            )),
        )
        .unwrap();
    assert!(matches!(builder.build(), Err(CodecError::UnknownType(_))));

    let mut builder = TypeRegistryBuilder::new();
    builder
        .register_type(plain_type("A", 1, 2).with_field(FieldDescriptor::new(
            "Mask",
            FieldKind::EnumMask("NoSuchEnum".to_string()),
        )))
        .unwrap();
    assert!(matches!(builder.build(), Err(CodecError::UnknownEnum(_))));
}

#[test]
fn base_chain_flattens_base_fields_first() {
    let registry = test_registry();
    let fields = registry.resolve_field_order(&audit_event_type()).unwrap();
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["EventId", "Time", "ActionName"]);
}

#[test]
fn abstract_types_cannot_be_instantiated() {
    let registry = test_registry();
    assert!(matches!(
        registry.new_structure(&base_event_type()),
        Err(CodecError::AbstractType(_))
    ));
    // The concrete derived type can.
    let event = registry.new_structure(&audit_event_type()).unwrap();
    assert_eq!(event.field_count(), 3);
}

#[test]
fn new_structure_starts_with_null_defaults() {
    let registry = test_registry();
    let value = registry.new_structure(&read_value_id_type()).unwrap();
    assert_eq!(value.get("NodeId"), Some(&WireValue::NodeId(NodeId::null())));
    assert_eq!(value.get("AttributeId"), Some(&WireValue::UInt32(0)));
    assert_eq!(
        value.get("IndexRange"),
        Some(&WireValue::String(UAString::null()))
    );
    assert_eq!(value.get("NoSuchField"), None);
}

#[test]
fn set_rejects_wrong_kind_and_unknown_field() {
    let registry = test_registry();
    let mut value = registry.new_structure(&read_value_id_type()).unwrap();
    let err = value.set("AttributeId", "not a number").unwrap_err();
    assert!(matches!(
        err,
        CodecError::Context { .. }
    ));
    assert_eq!(err.status(), StatusCode::BAD_TYPE_MISMATCH);
    assert!(matches!(
        value.set("Bogus", 1u32),
        Err(CodecError::UnknownField(..))
    ));
}
