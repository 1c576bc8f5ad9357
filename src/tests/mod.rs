// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

use std::fmt::Debug;
use std::io::Cursor;

pub use crate::*;

mod bitmask;
mod clone_eq;
mod codec;
mod diagnostics;
mod encoding;
mod registry;

/// Encodes the value, checks `byte_len` against the bytes actually written,
/// decodes it back and compares. Returns the decoded value.
pub fn serialize_test_and_return<T>(value: T) -> T
where
    T: BinaryCodable + Debug + PartialEq + Clone,
{
    let buf = value.encode_to_vec().unwrap();
    assert_eq!(buf.len(), value.byte_len());
    let mut stream = Cursor::new(buf);
    let decoded = T::decode(&mut stream, &DecodingOptions::test()).unwrap();
    assert_eq!(decoded, value);
    decoded
}

pub fn serialize_test<T>(value: T)
where
    T: BinaryCodable + Debug + PartialEq + Clone,
{
    let _ = serialize_test_and_return(value);
}

/// Encodes the value and compares against the expected wire bytes.
pub fn serialize_and_compare<T>(value: T, expected: &[u8])
where
    T: BinaryCodable,
{
    let buf = value.encode_to_vec().unwrap();
    assert_eq!(buf, expected);
}

// Node ids of the fixture schema. The layout mirrors a read service: a
// request holding an array of per-node read targets, plus an audit event
// type with a base chain and a type with optional fields.
pub fn read_value_id_type() -> NodeId {
    NodeId::new(0, 626u32)
}

pub fn read_value_id_xml() -> NodeId {
    NodeId::new(0, 627u32)
}

pub fn read_value_id_binary() -> NodeId {
    NodeId::new(0, 628u32)
}

pub fn read_request_type() -> NodeId {
    NodeId::new(0, 629u32)
}

pub fn read_request_xml() -> NodeId {
    NodeId::new(0, 630u32)
}

pub fn read_request_binary() -> NodeId {
    NodeId::new(0, 631u32)
}

pub fn base_event_type() -> NodeId {
    NodeId::new(0, 2041u32)
}

pub fn audit_event_type() -> NodeId {
    NodeId::new(0, 2052u32)
}

pub fn audit_event_binary() -> NodeId {
    NodeId::new(0, 2053u32)
}

pub fn history_read_type() -> NodeId {
    NodeId::new(0, 644u32)
}

pub fn history_read_binary() -> NodeId {
    NodeId::new(0, 645u32)
}

pub fn access_description_type() -> NodeId {
    NodeId::new(0, 700u32)
}

pub fn access_description_binary() -> NodeId {
    NodeId::new(0, 701u32)
}

/// The registry every codec test runs against.
pub fn test_registry() -> TypeRegistry {
    let mut builder = TypeRegistryBuilder::new();
    builder
        .register_enum(EnumDescriptor::new(
            "AccessLevel",
            &[
                ("CurrentRead", 1),
                ("CurrentWrite", 2),
                ("HistoryRead", 4),
                ("HistoryWrite", 8),
                // Composite of CurrentRead | CurrentWrite.
                ("CurrentReadWrite", 3),
            ],
        ))
        .unwrap();
    builder
        .register_type(
            TypeDescriptor::new(
                "ReadValueId",
                read_value_id_type(),
                read_value_id_binary(),
                read_value_id_xml(),
            )
            .with_field(FieldDescriptor::new("NodeId", FieldKind::NodeId))
            .with_field(FieldDescriptor::new("AttributeId", FieldKind::UInt32))
            .with_field(FieldDescriptor::new("IndexRange", FieldKind::String))
            .with_field(FieldDescriptor::new(
                "DataEncoding",
                FieldKind::QualifiedName,
            )),
        )
        .unwrap();
    builder
        .register_type(
            TypeDescriptor::new(
                "ReadRequest",
                read_request_type(),
                read_request_binary(),
                read_request_xml(),
            )
            .with_field(FieldDescriptor::new("MaxAge", FieldKind::Double))
            .with_field(FieldDescriptor::array(
                "NodesToRead",
                FieldKind::Struct(read_value_id_type()),
            )),
        )
        .unwrap();
    builder
        .register_type(
            TypeDescriptor::new(
                "BaseEventType",
                base_event_type(),
                NodeId::null(),
                NodeId::null(),
            )
            .abstract_type()
            .with_field(FieldDescriptor::new("EventId", FieldKind::ByteString))
            .with_field(FieldDescriptor::new("Time", FieldKind::DateTime)),
        )
        .unwrap();
    builder
        .register_type(
            TypeDescriptor::new(
                "AuditEventType",
                audit_event_type(),
                audit_event_binary(),
                NodeId::null(),
            )
            .with_base(base_event_type())
            .with_field(FieldDescriptor::new("ActionName", FieldKind::String)),
        )
        .unwrap();
    builder
        .register_type(
            TypeDescriptor::new(
                "HistoryReadDetails",
                history_read_type(),
                history_read_binary(),
                NodeId::null(),
            )
            .with_field(FieldDescriptor::new("StartTime", FieldKind::DateTime))
            .with_field(FieldDescriptor::optional("NumValues", FieldKind::UInt32))
            .with_field(FieldDescriptor::optional("Bounds", FieldKind::String)),
        )
        .unwrap();
    builder
        .register_type(
            TypeDescriptor::new(
                "AccessDescription",
                access_description_type(),
                access_description_binary(),
                NodeId::null(),
            )
            .with_field(FieldDescriptor::new("BrowseName", FieldKind::QualifiedName))
            .with_field(FieldDescriptor::new(
                "UserAccessLevel",
                FieldKind::EnumMask("AccessLevel".to_string()),
            )),
        )
        .unwrap();
    builder.build().unwrap()
}

/// A filled-in ReadValueId used by several tests.
pub fn sample_read_value_id(registry: &TypeRegistry) -> Structure {
    let mut value = registry.new_structure(&read_value_id_type()).unwrap();
    value
        .set("NodeId", NodeId::new(2, 100u32))
        .unwrap()
        .set("AttributeId", 13u32)
        .unwrap();
    value
}
