// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! The schema-driven binary codec. `BinaryEncoder` walks a `Structure`
//! against its flattened schema and writes the Part 6 binary form;
//! `BinaryDecoder` does the reverse, all-or-nothing per structure, and also
//! resolves extension object bodies and decodes batches with per-item
//! status.

use std::{
    io::{Cursor, Read, Write},
    sync::Arc,
};

use crate::{
    basic_types::{LocalizedText, QualifiedName},
    bitmask::EnumSet,
    byte_string::ByteString,
    constants,
    date_time::DateTime,
    descriptor::{FieldDescriptor, FieldKind, TypeDescriptor},
    diagnostic_info::DiagnosticInfo,
    encoding::{
        read_length_prefix, read_u32, write_all, write_i32, write_u32, BinaryCodable,
        DecodingOptions,
    },
    error::{CodecError, EncodingResult},
    extension_object::{ExtensionObject, ExtensionObjectBody},
    guid::Guid,
    node_id::{ExpandedNodeId, NodeId},
    registry::TypeRegistry,
    status_code::StatusCode,
    string::UAString,
    value::{Structure, WireValue},
};

/// Whether an optional field counts as present for the leading presence
/// mask. A scalar is present unless it is `Null`; an array is present
/// unless it is the null array.
fn optional_present(field: &FieldDescriptor, value: &WireValue) -> bool {
    if field.array {
        matches!(value, WireValue::Array(Some(_)))
    } else {
        !value.is_null()
    }
}

/// Encodes structures to their binary wire form. Every structure carries
/// its own flattened schema, so no registry is consulted on the encode
/// path.
pub struct BinaryEncoder {
    max_array_length: usize,
}

impl Default for BinaryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryEncoder {
    pub fn new() -> BinaryEncoder {
        BinaryEncoder {
            max_array_length: constants::MAX_ARRAY_LENGTH,
        }
    }

    pub fn with_max_array_length(mut self, max: usize) -> BinaryEncoder {
        self.max_array_length = max;
        self
    }

    /// The exact number of bytes `encode_structure` would write.
    pub fn byte_len_structure(&self, structure: &Structure) -> EncodingResult<usize> {
        let mut size = if has_optional_fields(structure.schema()) {
            4
        } else {
            0
        };
        for (field, value) in structure.iter() {
            if field.optional && !optional_present(field, value) {
                continue;
            }
            size += self.byte_len_field(field, value)?;
        }
        Ok(size)
    }

    /// Writes the structure's fields in flattened schema order, preceded by
    /// the optional-field presence mask when the schema has optional
    /// fields. Errors carry the dotted field path they arose at.
    pub fn encode_structure<S: Write>(
        &self,
        structure: &Structure,
        stream: &mut S,
    ) -> EncodingResult<usize> {
        self.encode_structure_inner(structure, stream)
            .map_err(|e| e.at(structure.name()))
    }

    fn encode_structure_inner<S: Write>(
        &self,
        structure: &Structure,
        stream: &mut S,
    ) -> EncodingResult<usize> {
        let mut size = 0;
        if has_optional_fields(structure.schema()) {
            size += write_u32(stream, optional_mask(structure))?;
        }
        for (field, value) in structure.iter() {
            if field.optional && !optional_present(field, value) {
                continue;
            }
            size += self
                .encode_field(field, value, stream)
                .map_err(|e| e.at(&field.name))?;
        }
        Ok(size)
    }

    /// Serializes the structure and wraps it in an extension object tagged
    /// with the type's binary encoding id.
    pub fn extension_object(&self, structure: &Structure) -> EncodingResult<ExtensionObject> {
        let encoding_id = structure.binary_encoding_id();
        if encoding_id.is_null() {
            error!("Type {} has no binary encoding id", structure.name());
            return Err(CodecError::UnsupportedField("binary encoding"));
        }
        let mut stream = Cursor::new(Vec::new());
        self.encode_structure(structure, &mut stream)?;
        Ok(ExtensionObject {
            type_id: encoding_id.clone(),
            body: ExtensionObjectBody::Binary(ByteString::from(stream.into_inner())),
        })
    }

    fn byte_len_field(&self, field: &FieldDescriptor, value: &WireValue) -> EncodingResult<usize> {
        if field.array {
            return match value {
                WireValue::Null | WireValue::Array(None) => Ok(4),
                WireValue::Array(Some(elements)) => {
                    let mut size = 4;
                    for element in elements {
                        size += self.byte_len_scalar(&field.kind, element)?;
                    }
                    Ok(size)
                }
                other => Err(CodecError::FieldTypeMismatch {
                    expected: "Array",
                    actual: other.kind_name(),
                }),
            };
        }
        self.byte_len_scalar(&field.kind, value)
    }

    fn byte_len_scalar(&self, kind: &FieldKind, value: &WireValue) -> EncodingResult<usize> {
        Ok(match (kind, value) {
            (FieldKind::Boolean, WireValue::Boolean(v)) => v.byte_len(),
            (FieldKind::SByte, WireValue::SByte(v)) => v.byte_len(),
            (FieldKind::Byte, WireValue::Byte(v)) => v.byte_len(),
            (FieldKind::Int16, WireValue::Int16(v)) => v.byte_len(),
            (FieldKind::UInt16, WireValue::UInt16(v)) => v.byte_len(),
            (FieldKind::Int32, WireValue::Int32(v)) => v.byte_len(),
            (FieldKind::UInt32, WireValue::UInt32(v)) => v.byte_len(),
            (FieldKind::Int64, WireValue::Int64(v)) => v.byte_len(),
            (FieldKind::UInt64, WireValue::UInt64(v)) => v.byte_len(),
            (FieldKind::Float, WireValue::Float(v)) => v.byte_len(),
            (FieldKind::Double, WireValue::Double(v)) => v.byte_len(),
            (FieldKind::String, WireValue::String(v)) => v.byte_len(),
            (FieldKind::XmlElement, WireValue::String(v)) => v.byte_len(),
            (FieldKind::ByteString, WireValue::ByteString(v)) => v.byte_len(),
            (FieldKind::Guid, WireValue::Guid(v)) => v.byte_len(),
            (FieldKind::NodeId, WireValue::NodeId(v)) => v.byte_len(),
            (FieldKind::ExpandedNodeId, WireValue::ExpandedNodeId(v)) => v.byte_len(),
            (FieldKind::StatusCode, WireValue::StatusCode(v)) => v.byte_len(),
            (FieldKind::DateTime, WireValue::DateTime(v)) => v.byte_len(),
            (FieldKind::QualifiedName, WireValue::QualifiedName(v)) => v.byte_len(),
            (FieldKind::LocalizedText, WireValue::LocalizedText(v)) => v.byte_len(),
            (FieldKind::DiagnosticInfo, WireValue::DiagnosticInfo(v)) => v.byte_len(),
            (FieldKind::ExtensionObject, WireValue::ExtensionObject(v)) => v.byte_len(),
            (FieldKind::EnumMask(_), WireValue::EnumSet(_)) => 4,
            (FieldKind::Struct(_), WireValue::Structure(v)) => self.byte_len_structure(v)?,
            // Nulls encode as the kind's null form where one exists.
            (_, WireValue::Null) => self.null_scalar(kind)?.len(),
            (kind, value) => {
                return Err(CodecError::FieldTypeMismatch {
                    expected: kind.name(),
                    actual: value.kind_name(),
                })
            }
        })
    }

    fn encode_field<S: Write>(
        &self,
        field: &FieldDescriptor,
        value: &WireValue,
        stream: &mut S,
    ) -> EncodingResult<usize> {
        if field.array {
            return match value {
                WireValue::Null | WireValue::Array(None) => write_i32(stream, -1),
                WireValue::Array(Some(elements)) => {
                    if elements.len() > self.max_array_length {
                        return Err(CodecError::ArrayTooLarge {
                            len: elements.len(),
                            max: self.max_array_length,
                        });
                    }
                    let mut size = write_i32(stream, elements.len() as i32)?;
                    for element in elements {
                        size += self.encode_scalar(&field.kind, element, stream)?;
                    }
                    Ok(size)
                }
                other => Err(CodecError::FieldTypeMismatch {
                    expected: "Array",
                    actual: other.kind_name(),
                }),
            };
        }
        self.encode_scalar(&field.kind, value, stream)
    }

    fn encode_scalar<S: Write>(
        &self,
        kind: &FieldKind,
        value: &WireValue,
        stream: &mut S,
    ) -> EncodingResult<usize> {
        match (kind, value) {
            (FieldKind::Boolean, WireValue::Boolean(v)) => v.encode(stream),
            (FieldKind::SByte, WireValue::SByte(v)) => v.encode(stream),
            (FieldKind::Byte, WireValue::Byte(v)) => v.encode(stream),
            (FieldKind::Int16, WireValue::Int16(v)) => v.encode(stream),
            (FieldKind::UInt16, WireValue::UInt16(v)) => v.encode(stream),
            (FieldKind::Int32, WireValue::Int32(v)) => v.encode(stream),
            (FieldKind::UInt32, WireValue::UInt32(v)) => v.encode(stream),
            (FieldKind::Int64, WireValue::Int64(v)) => v.encode(stream),
            (FieldKind::UInt64, WireValue::UInt64(v)) => v.encode(stream),
            (FieldKind::Float, WireValue::Float(v)) => v.encode(stream),
            (FieldKind::Double, WireValue::Double(v)) => v.encode(stream),
            (FieldKind::String, WireValue::String(v)) => v.encode(stream),
            (FieldKind::XmlElement, WireValue::String(v)) => v.encode(stream),
            (FieldKind::ByteString, WireValue::ByteString(v)) => v.encode(stream),
            (FieldKind::Guid, WireValue::Guid(v)) => v.encode(stream),
            (FieldKind::NodeId, WireValue::NodeId(v)) => v.encode(stream),
            (FieldKind::ExpandedNodeId, WireValue::ExpandedNodeId(v)) => v.encode(stream),
            (FieldKind::StatusCode, WireValue::StatusCode(v)) => v.encode(stream),
            (FieldKind::DateTime, WireValue::DateTime(v)) => v.encode(stream),
            (FieldKind::QualifiedName, WireValue::QualifiedName(v)) => v.encode(stream),
            (FieldKind::LocalizedText, WireValue::LocalizedText(v)) => v.encode(stream),
            (FieldKind::DiagnosticInfo, WireValue::DiagnosticInfo(v)) => v.encode(stream),
            (FieldKind::ExtensionObject, WireValue::ExtensionObject(v)) => v.encode(stream),
            (FieldKind::EnumMask(_), WireValue::EnumSet(v)) => write_u32(stream, v.mask()),
            (FieldKind::Struct(_), WireValue::Structure(v)) => {
                self.encode_structure_inner(v, stream)
            }
            (kind, WireValue::Null) => {
                let encoded = self.null_scalar(kind)?;
                write_all(stream, &encoded)
            }
            (kind, value) => Err(CodecError::FieldTypeMismatch {
                expected: kind.name(),
                actual: value.kind_name(),
            }),
        }
    }

    /// The wire form of a null value of the given kind. Fixed-width kinds
    /// and nested structures have no null form; a `Null` left in such a
    /// slot is a caller error.
    fn null_scalar(&self, kind: &FieldKind) -> EncodingResult<Vec<u8>> {
        let encoded = match kind {
            FieldKind::String
            | FieldKind::XmlElement
            | FieldKind::ByteString => vec![0xff, 0xff, 0xff, 0xff],
            FieldKind::NodeId => NodeId::null().encode_to_vec()?,
            FieldKind::ExpandedNodeId => ExpandedNodeId::null().encode_to_vec()?,
            FieldKind::Guid => Guid::null().encode_to_vec()?,
            FieldKind::QualifiedName => QualifiedName::null().encode_to_vec()?,
            FieldKind::LocalizedText => LocalizedText::null().encode_to_vec()?,
            FieldKind::DiagnosticInfo => DiagnosticInfo::null().encode_to_vec()?,
            FieldKind::ExtensionObject => ExtensionObject::null().encode_to_vec()?,
            // The empty set.
            FieldKind::EnumMask(_) => 0u32.encode_to_vec()?,
            kind => {
                return Err(CodecError::FieldTypeMismatch {
                    expected: kind.name(),
                    actual: "Null",
                })
            }
        };
        Ok(encoded)
    }
}

fn has_optional_fields(schema: &[FieldDescriptor]) -> bool {
    schema.iter().any(|f| f.optional)
}

/// The presence mask written ahead of a structure with optional fields.
/// Bit i corresponds to the i-th optional field in schema order.
fn optional_mask(structure: &Structure) -> u32 {
    let mut mask = 0;
    let mut bit = 0;
    for (field, value) in structure.iter() {
        if !field.optional {
            continue;
        }
        if optional_present(field, value) {
            mask |= 1 << bit;
        }
        bit += 1;
    }
    mask
}

/// One decoded item of a batch, carrying its own status so one damaged item
/// cannot sink its neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub status: StatusCode,
    pub value: WireValue,
}

impl BatchItem {
    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }
}

/// Decodes binary wire forms back into structures, using the registry for
/// schema lookup. Decoding a structure is all-or-nothing; batches degrade
/// per item instead.
pub struct BinaryDecoder<'a> {
    registry: &'a TypeRegistry,
    options: DecodingOptions,
}

impl<'a> BinaryDecoder<'a> {
    pub fn new(registry: &'a TypeRegistry, options: DecodingOptions) -> BinaryDecoder<'a> {
        BinaryDecoder { registry, options }
    }

    pub fn options(&self) -> &DecodingOptions {
        &self.options
    }

    /// Decodes one structure of the given type from the stream. Any error
    /// fails the whole structure and carries the dotted field path.
    pub fn decode_structure<S: Read>(
        &self,
        type_id: &NodeId,
        stream: &mut S,
    ) -> EncodingResult<Structure> {
        let descriptor = self.registry.lookup_by_type_id(type_id)?;
        if descriptor.is_abstract {
            return Err(CodecError::AbstractType(type_id.clone()));
        }
        let schema = self.registry.resolve_field_order(type_id)?;
        self.decode_with_schema(descriptor, schema, stream)
            .map_err(|e| e.at(&descriptor.name))
    }

    fn decode_with_schema<S: Read>(
        &self,
        descriptor: &Arc<TypeDescriptor>,
        schema: &Arc<Vec<FieldDescriptor>>,
        stream: &mut S,
    ) -> EncodingResult<Structure> {
        // Nested structures recurse through decode_scalar, so the whole
        // tree counts against the depth limit.
        let _depth_lock = self.options.depth_lock()?;
        let mask = if has_optional_fields(schema) {
            read_u32(stream)?
        } else {
            0
        };
        let mut values = Vec::with_capacity(schema.len());
        let mut optional_bit = 0;
        for field in schema.iter() {
            if field.optional {
                let present = mask & (1 << optional_bit) != 0;
                optional_bit += 1;
                if !present {
                    values.push(if field.array {
                        WireValue::Array(None)
                    } else {
                        WireValue::Null
                    });
                    continue;
                }
            }
            let value = self
                .decode_field(field, stream)
                .map_err(|e| e.at(&field.name))?;
            values.push(value);
        }
        Ok(Structure::from_parts(
            descriptor.clone(),
            schema.clone(),
            values,
        ))
    }

    fn decode_field<S: Read>(
        &self,
        field: &FieldDescriptor,
        stream: &mut S,
    ) -> EncodingResult<WireValue> {
        if field.array {
            let len = match read_length_prefix(stream, "Array", self.options.max_array_length)? {
                None => return Ok(WireValue::Array(None)),
                Some(len) => len,
            };
            let mut elements = Vec::with_capacity(len);
            for _ in 0..len {
                elements.push(self.decode_scalar(&field.kind, stream)?);
            }
            return Ok(WireValue::Array(Some(elements)));
        }
        self.decode_scalar(&field.kind, stream)
    }

    fn decode_scalar<S: Read>(
        &self,
        kind: &FieldKind,
        stream: &mut S,
    ) -> EncodingResult<WireValue> {
        let options = &self.options;
        Ok(match kind {
            FieldKind::Boolean => WireValue::Boolean(bool::decode(stream, options)?),
            FieldKind::SByte => WireValue::SByte(i8::decode(stream, options)?),
            FieldKind::Byte => WireValue::Byte(u8::decode(stream, options)?),
            FieldKind::Int16 => WireValue::Int16(i16::decode(stream, options)?),
            FieldKind::UInt16 => WireValue::UInt16(u16::decode(stream, options)?),
            FieldKind::Int32 => WireValue::Int32(i32::decode(stream, options)?),
            FieldKind::UInt32 => WireValue::UInt32(u32::decode(stream, options)?),
            FieldKind::Int64 => WireValue::Int64(i64::decode(stream, options)?),
            FieldKind::UInt64 => WireValue::UInt64(u64::decode(stream, options)?),
            FieldKind::Float => WireValue::Float(f32::decode(stream, options)?),
            FieldKind::Double => WireValue::Double(f64::decode(stream, options)?),
            FieldKind::String | FieldKind::XmlElement => {
                WireValue::String(UAString::decode(stream, options)?)
            }
            FieldKind::ByteString => WireValue::ByteString(ByteString::decode(stream, options)?),
            FieldKind::Guid => WireValue::Guid(Guid::decode(stream, options)?),
            FieldKind::NodeId => WireValue::NodeId(NodeId::decode(stream, options)?),
            FieldKind::ExpandedNodeId => {
                WireValue::ExpandedNodeId(ExpandedNodeId::decode(stream, options)?)
            }
            FieldKind::StatusCode => WireValue::StatusCode(StatusCode::decode(stream, options)?),
            FieldKind::DateTime => WireValue::DateTime(DateTime::decode(stream, options)?),
            FieldKind::QualifiedName => {
                WireValue::QualifiedName(QualifiedName::decode(stream, options)?)
            }
            FieldKind::LocalizedText => {
                WireValue::LocalizedText(LocalizedText::decode(stream, options)?)
            }
            FieldKind::DiagnosticInfo => {
                WireValue::DiagnosticInfo(Box::new(DiagnosticInfo::decode(stream, options)?))
            }
            FieldKind::ExtensionObject => {
                let object = ExtensionObject::decode(stream, options)?;
                self.resolve_extension_object(&object)?
            }
            FieldKind::EnumMask(name) => {
                let descriptor = self.registry.lookup_enum(name)?;
                WireValue::EnumSet(EnumSet::from_mask(descriptor.clone(), read_u32(stream)?))
            }
            FieldKind::Struct(type_id) => {
                let descriptor = self.registry.lookup_by_type_id(type_id)?;
                let schema = self.registry.resolve_field_order(type_id)?;
                WireValue::Structure(self.decode_with_schema(descriptor, schema, stream)?)
            }
        })
    }

    /// Resolves an extension object against the registry. A binary body of
    /// a known type decodes into a structure; anything else stays an opaque
    /// extension object and round-trips byte-for-byte.
    pub fn resolve_extension_object(
        &self,
        object: &ExtensionObject,
    ) -> EncodingResult<WireValue> {
        match &object.body {
            ExtensionObjectBody::Binary(bytes) => {
                let descriptor = match self.registry.try_lookup_by_binary_id(&object.type_id) {
                    Some(descriptor) => descriptor,
                    None => {
                        debug!(
                            "Extension object type {} is unknown, keeping the raw body",
                            object.type_id
                        );
                        return Ok(WireValue::ExtensionObject(object.clone()));
                    }
                };
                let body = bytes
                    .value()
                    .ok_or(CodecError::MalformedLength(-1))
                    .map_err(|e| e.at(&descriptor.name))?;
                let schema = self.registry.resolve_field_order(&descriptor.type_id)?;
                let mut stream = Cursor::new(body);
                let structure = self
                    .decode_with_schema(descriptor, schema, &mut stream)
                    .map_err(|e| e.at(&descriptor.name))?;
                // The body length is exact; leftover bytes mean the payload
                // does not match the asserted type.
                let consumed = stream.position() as usize;
                if consumed < body.len() {
                    return Err(
                        CodecError::TrailingBytes(body.len() - consumed).at(&descriptor.name)
                    );
                }
                Ok(WireValue::Structure(structure))
            }
            // XML bodies resolve through the XML decoder.
            ExtensionObjectBody::Xml(_) | ExtensionObjectBody::None => {
                Ok(WireValue::ExtensionObject(object.clone()))
            }
        }
    }

    /// Decodes a batch of extension objects, one `BatchItem` per input. An
    /// item that fails keeps its error status and a `Null` value; the rest
    /// of the batch is unaffected.
    pub fn decode_batch(&self, objects: &[ExtensionObject]) -> Vec<BatchItem> {
        objects
            .iter()
            .map(|object| match self.resolve_extension_object(object) {
                Ok(value) => BatchItem {
                    status: StatusCode::GOOD,
                    value,
                },
                Err(err) => {
                    warn!("Batch item failed to decode - {}", err);
                    BatchItem {
                        status: err.status(),
                        value: WireValue::Null,
                    }
                }
            })
            .collect()
    }
}
