// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains `TypeDescriptor`, the codec's schema record for one structure
//! type. Deep inheritance in the source dictionaries is represented by
//! composition: a descriptor lists its own fields plus a base-type link the
//! registry flattens once at build time, so no runtime dispatch is needed
//! for field layout.

use crate::node_id::NodeId;

/// The wire kind of one field.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum FieldKind {
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    ByteString,
    XmlElement,
    Guid,
    NodeId,
    ExpandedNodeId,
    StatusCode,
    DateTime,
    QualifiedName,
    LocalizedText,
    DiagnosticInfo,
    ExtensionObject,
    /// A nested structure, referenced by its type id.
    Struct(NodeId),
    /// A flag enumeration, referenced by its registered name. UInt32 on
    /// the wire.
    EnumMask(String),
}

impl FieldKind {
    /// A short name for error messages and paths.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "Boolean",
            FieldKind::SByte => "SByte",
            FieldKind::Byte => "Byte",
            FieldKind::Int16 => "Int16",
            FieldKind::UInt16 => "UInt16",
            FieldKind::Int32 => "Int32",
            FieldKind::UInt32 => "UInt32",
            FieldKind::Int64 => "Int64",
            FieldKind::UInt64 => "UInt64",
            FieldKind::Float => "Float",
            FieldKind::Double => "Double",
            FieldKind::String => "String",
            FieldKind::ByteString => "ByteString",
            FieldKind::XmlElement => "XmlElement",
            FieldKind::Guid => "Guid",
            FieldKind::NodeId => "NodeId",
            FieldKind::ExpandedNodeId => "ExpandedNodeId",
            FieldKind::StatusCode => "StatusCode",
            FieldKind::DateTime => "DateTime",
            FieldKind::QualifiedName => "QualifiedName",
            FieldKind::LocalizedText => "LocalizedText",
            FieldKind::DiagnosticInfo => "DiagnosticInfo",
            FieldKind::ExtensionObject => "ExtensionObject",
            FieldKind::Struct(_) => "Structure",
            FieldKind::EnumMask(_) => "EnumMask",
        }
    }
}

/// One field of a structure schema.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    /// Array-valued field: Int32 length prefix then elements.
    pub array: bool,
    /// Optional field: presence driven by the structure's leading
    /// optional-field mask.
    pub optional: bool,
}

impl FieldDescriptor {
    pub fn new(name: &str, kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            kind,
            array: false,
            optional: false,
        }
    }

    pub fn array(name: &str, kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            kind,
            array: true,
            optional: false,
        }
    }

    pub fn optional(name: &str, kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            kind,
            array: false,
            optional: true,
        }
    }
}

/// The schema record of one structure type. Immutable once registered; the
/// (type id, binary id, xml id) triple is unique for the process lifetime.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TypeDescriptor {
    /// The name used for the root element of the XML form and in error paths.
    pub name: String,
    pub type_id: NodeId,
    pub binary_encoding_id: NodeId,
    pub xml_encoding_id: NodeId,
    /// The type this one derives from, if any. Base fields are encoded
    /// before this type's own fields.
    pub base_type: Option<NodeId>,
    /// Abstract types may be bases but never instances.
    pub is_abstract: bool,
    /// This type's own fields, in schema order, excluding base fields.
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: &str, type_id: NodeId, binary_id: NodeId, xml_id: NodeId) -> TypeDescriptor {
        TypeDescriptor {
            name: name.to_string(),
            type_id,
            binary_encoding_id: binary_id,
            xml_encoding_id: xml_id,
            base_type: None,
            is_abstract: false,
            fields: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: NodeId) -> TypeDescriptor {
        self.base_type = Some(base);
        self
    }

    pub fn abstract_type(mut self) -> TypeDescriptor {
        self.is_abstract = true;
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> TypeDescriptor {
        self.fields.push(field);
        self
    }
}
