// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! The dynamic value model: `WireValue`, a tagged union over every wire
//! kind, and `Structure`, a schema-ordered field vector standing in for the
//! generated structure classes of the source dictionaries.

use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{
    basic_types::{LocalizedText, QualifiedName},
    bitmask::EnumSet,
    byte_string::ByteString,
    date_time::DateTime,
    descriptor::{FieldDescriptor, FieldKind, TypeDescriptor},
    diagnostic_info::DiagnosticInfo,
    error::{CodecError, EncodingResult},
    extension_object::ExtensionObject,
    guid::Guid,
    node_id::{ExpandedNodeId, NodeId},
    status_code::StatusCode,
    string::UAString,
};

/// A single decoded value of any wire kind.
#[derive(PartialEq, Debug, Clone)]
pub enum WireValue {
    /// Absence of a value, e.g. an unset optional field.
    Null,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(UAString),
    ByteString(ByteString),
    Guid(Guid),
    NodeId(NodeId),
    ExpandedNodeId(ExpandedNodeId),
    StatusCode(StatusCode),
    DateTime(DateTime),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    DiagnosticInfo(Box<DiagnosticInfo>),
    ExtensionObject(ExtensionObject),
    EnumSet(EnumSet),
    Structure(Structure),
    /// An array of values. `None` is a null array, distinct from an empty
    /// one.
    Array(Option<Vec<WireValue>>),
}

impl Default for WireValue {
    fn default() -> Self {
        WireValue::Null
    }
}

// Variant tags for hashing. Floats hash by bit pattern.
impl Hash for WireValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            WireValue::Null => {}
            WireValue::Boolean(v) => v.hash(state),
            WireValue::SByte(v) => v.hash(state),
            WireValue::Byte(v) => v.hash(state),
            WireValue::Int16(v) => v.hash(state),
            WireValue::UInt16(v) => v.hash(state),
            WireValue::Int32(v) => v.hash(state),
            WireValue::UInt32(v) => v.hash(state),
            WireValue::Int64(v) => v.hash(state),
            WireValue::UInt64(v) => v.hash(state),
            WireValue::Float(v) => v.to_bits().hash(state),
            WireValue::Double(v) => v.to_bits().hash(state),
            WireValue::String(v) => v.hash(state),
            WireValue::ByteString(v) => v.hash(state),
            WireValue::Guid(v) => v.hash(state),
            WireValue::NodeId(v) => v.hash(state),
            WireValue::ExpandedNodeId(v) => v.hash(state),
            WireValue::StatusCode(v) => v.hash(state),
            WireValue::DateTime(v) => v.hash(state),
            WireValue::QualifiedName(v) => v.hash(state),
            WireValue::LocalizedText(v) => v.hash(state),
            WireValue::DiagnosticInfo(v) => v.hash(state),
            WireValue::ExtensionObject(v) => v.hash(state),
            WireValue::EnumSet(v) => v.hash(state),
            WireValue::Structure(v) => v.hash(state),
            WireValue::Array(v) => v.hash(state),
        }
    }
}

impl WireValue {
    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    /// A short name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            WireValue::Null => "Null",
            WireValue::Boolean(_) => "Boolean",
            WireValue::SByte(_) => "SByte",
            WireValue::Byte(_) => "Byte",
            WireValue::Int16(_) => "Int16",
            WireValue::UInt16(_) => "UInt16",
            WireValue::Int32(_) => "Int32",
            WireValue::UInt32(_) => "UInt32",
            WireValue::Int64(_) => "Int64",
            WireValue::UInt64(_) => "UInt64",
            WireValue::Float(_) => "Float",
            WireValue::Double(_) => "Double",
            WireValue::String(_) => "String",
            WireValue::ByteString(_) => "ByteString",
            WireValue::Guid(_) => "Guid",
            WireValue::NodeId(_) => "NodeId",
            WireValue::ExpandedNodeId(_) => "ExpandedNodeId",
            WireValue::StatusCode(_) => "StatusCode",
            WireValue::DateTime(_) => "DateTime",
            WireValue::QualifiedName(_) => "QualifiedName",
            WireValue::LocalizedText(_) => "LocalizedText",
            WireValue::DiagnosticInfo(_) => "DiagnosticInfo",
            WireValue::ExtensionObject(_) => "ExtensionObject",
            WireValue::EnumSet(_) => "EnumSet",
            WireValue::Structure(_) => "Structure",
            WireValue::Array(_) => "Array",
        }
    }

    /// Whether this value can fill a scalar slot of the given field kind.
    /// `Null` is acceptable everywhere; whether the schema permits it is
    /// the encoder's decision.
    pub fn matches_kind(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (WireValue::Null, _) => true,
            (WireValue::Boolean(_), FieldKind::Boolean) => true,
            (WireValue::SByte(_), FieldKind::SByte) => true,
            (WireValue::Byte(_), FieldKind::Byte) => true,
            (WireValue::Int16(_), FieldKind::Int16) => true,
            (WireValue::UInt16(_), FieldKind::UInt16) => true,
            (WireValue::Int32(_), FieldKind::Int32) => true,
            (WireValue::UInt32(_), FieldKind::UInt32) => true,
            (WireValue::Int64(_), FieldKind::Int64) => true,
            (WireValue::UInt64(_), FieldKind::UInt64) => true,
            (WireValue::Float(_), FieldKind::Float) => true,
            (WireValue::Double(_), FieldKind::Double) => true,
            (WireValue::String(_), FieldKind::String) => true,
            (WireValue::String(_), FieldKind::XmlElement) => true,
            (WireValue::ByteString(_), FieldKind::ByteString) => true,
            (WireValue::Guid(_), FieldKind::Guid) => true,
            (WireValue::NodeId(_), FieldKind::NodeId) => true,
            (WireValue::ExpandedNodeId(_), FieldKind::ExpandedNodeId) => true,
            (WireValue::StatusCode(_), FieldKind::StatusCode) => true,
            (WireValue::DateTime(_), FieldKind::DateTime) => true,
            (WireValue::QualifiedName(_), FieldKind::QualifiedName) => true,
            (WireValue::LocalizedText(_), FieldKind::LocalizedText) => true,
            (WireValue::DiagnosticInfo(_), FieldKind::DiagnosticInfo) => true,
            (WireValue::ExtensionObject(_), FieldKind::ExtensionObject) => true,
            (WireValue::EnumSet(set), FieldKind::EnumMask(name)) => {
                set.descriptor().name == *name
            }
            (WireValue::Structure(s), FieldKind::Struct(type_id)) => {
                s.type_id() == type_id
            }
            _ => false,
        }
    }

    /// The null/default value for a field slot. An absent optional field
    /// is `Null`, which the binary encoder maps to a clear presence bit.
    pub fn default_for(field: &FieldDescriptor) -> WireValue {
        if field.array {
            return WireValue::Array(None);
        }
        if field.optional {
            return WireValue::Null;
        }
        match &field.kind {
            FieldKind::Boolean => WireValue::Boolean(false),
            FieldKind::SByte => WireValue::SByte(0),
            FieldKind::Byte => WireValue::Byte(0),
            FieldKind::Int16 => WireValue::Int16(0),
            FieldKind::UInt16 => WireValue::UInt16(0),
            FieldKind::Int32 => WireValue::Int32(0),
            FieldKind::UInt32 => WireValue::UInt32(0),
            FieldKind::Int64 => WireValue::Int64(0),
            FieldKind::UInt64 => WireValue::UInt64(0),
            FieldKind::Float => WireValue::Float(0.0),
            FieldKind::Double => WireValue::Double(0.0),
            FieldKind::String | FieldKind::XmlElement => WireValue::String(UAString::null()),
            FieldKind::ByteString => WireValue::ByteString(ByteString::null()),
            FieldKind::Guid => WireValue::Guid(Guid::null()),
            FieldKind::NodeId => WireValue::NodeId(NodeId::null()),
            FieldKind::ExpandedNodeId => WireValue::ExpandedNodeId(ExpandedNodeId::null()),
            FieldKind::StatusCode => WireValue::StatusCode(StatusCode::GOOD),
            FieldKind::DateTime => WireValue::DateTime(DateTime::epoch()),
            FieldKind::QualifiedName => WireValue::QualifiedName(QualifiedName::null()),
            FieldKind::LocalizedText => WireValue::LocalizedText(LocalizedText::null()),
            FieldKind::DiagnosticInfo => WireValue::DiagnosticInfo(Box::default()),
            FieldKind::ExtensionObject => WireValue::ExtensionObject(ExtensionObject::null()),
            // Nested structures have no meaningful default; the encoder
            // rejects a Null left in a required slot.
            FieldKind::Struct(_) | FieldKind::EnumMask(_) => WireValue::Null,
        }
    }
}

macro_rules! wire_value_from {
    ($ty: ty, $variant: ident) => {
        impl From<$ty> for WireValue {
            fn from(v: $ty) -> Self {
                WireValue::$variant(v)
            }
        }
    };
}

wire_value_from!(bool, Boolean);
wire_value_from!(i8, SByte);
wire_value_from!(u8, Byte);
wire_value_from!(i16, Int16);
wire_value_from!(u16, UInt16);
wire_value_from!(i32, Int32);
wire_value_from!(u32, UInt32);
wire_value_from!(i64, Int64);
wire_value_from!(u64, UInt64);
wire_value_from!(f32, Float);
wire_value_from!(f64, Double);
wire_value_from!(UAString, String);
wire_value_from!(ByteString, ByteString);
wire_value_from!(Guid, Guid);
wire_value_from!(NodeId, NodeId);
wire_value_from!(ExpandedNodeId, ExpandedNodeId);
wire_value_from!(StatusCode, StatusCode);
wire_value_from!(DateTime, DateTime);
wire_value_from!(QualifiedName, QualifiedName);
wire_value_from!(LocalizedText, LocalizedText);
wire_value_from!(ExtensionObject, ExtensionObject);
wire_value_from!(EnumSet, EnumSet);
wire_value_from!(Structure, Structure);

impl From<&str> for WireValue {
    fn from(v: &str) -> Self {
        WireValue::String(UAString::from(v))
    }
}

impl From<DiagnosticInfo> for WireValue {
    fn from(v: DiagnosticInfo) -> Self {
        WireValue::DiagnosticInfo(Box::new(v))
    }
}

/// A dynamically typed structure instance. Field values sit in the order
/// fixed by the flattened schema, base fields first. This is the capability
/// boundary between generated schema data and the codec: everything the
/// codec needs is reachable from here.
#[derive(Debug, Clone)]
pub struct Structure {
    descriptor: Arc<TypeDescriptor>,
    schema: Arc<Vec<FieldDescriptor>>,
    values: Vec<WireValue>,
}

impl PartialEq for Structure {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.type_id == other.descriptor.type_id && self.values == other.values
    }
}

impl Hash for Structure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.type_id.hash(state);
        self.values.hash(state);
    }
}

impl Structure {
    pub(crate) fn with_default_fields(
        descriptor: Arc<TypeDescriptor>,
        schema: Arc<Vec<FieldDescriptor>>,
    ) -> Structure {
        let values = schema.iter().map(WireValue::default_for).collect();
        Structure {
            descriptor,
            schema,
            values,
        }
    }

    pub(crate) fn from_parts(
        descriptor: Arc<TypeDescriptor>,
        schema: Arc<Vec<FieldDescriptor>>,
        values: Vec<WireValue>,
    ) -> Structure {
        debug_assert_eq!(schema.len(), values.len());
        Structure {
            descriptor,
            schema,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn type_id(&self) -> &NodeId {
        &self.descriptor.type_id
    }

    pub fn binary_encoding_id(&self) -> &NodeId {
        &self.descriptor.binary_encoding_id
    }

    pub fn xml_encoding_id(&self) -> &NodeId {
        &self.descriptor.xml_encoding_id
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// The flattened field schema, base fields first.
    pub fn schema(&self) -> &[FieldDescriptor] {
        &self.schema
    }

    pub fn field_count(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, name: &str) -> Option<&WireValue> {
        let index = self.schema.iter().position(|f| f.name == name)?;
        Some(&self.values[index])
    }

    /// Sets a field by name. The value kind must match the schema; arrays
    /// must be set as `WireValue::Array`.
    pub fn set<V: Into<WireValue>>(&mut self, name: &str, value: V) -> EncodingResult<&mut Self> {
        let value = value.into();
        let index = self
            .schema
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| {
                CodecError::UnknownField(self.descriptor.type_id.clone(), name.to_string())
            })?;
        let field = &self.schema[index];
        let matches = if field.array {
            match &value {
                WireValue::Null => true,
                WireValue::Array(None) => true,
                WireValue::Array(Some(elements)) => {
                    elements.iter().all(|e| e.matches_kind(&field.kind))
                }
                _ => false,
            }
        } else {
            value.matches_kind(&field.kind)
        };
        if !matches {
            return Err(CodecError::FieldTypeMismatch {
                expected: field.kind.name(),
                actual: value.kind_name(),
            }
            .at(&format!("{}.{}", self.descriptor.name, name)));
        }
        // A bare Null on an array field normalizes to a null array.
        self.values[index] = if field.array && value.is_null() {
            WireValue::Array(None)
        } else {
            value
        };
        Ok(self)
    }

    /// Iterates (field descriptor, value) pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDescriptor, &WireValue)> {
        self.schema.iter().zip(self.values.iter())
    }
}
