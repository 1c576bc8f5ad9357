// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! The schema-driven XML codec. The encoder renders a `Structure` as one
//! XML element per field, the decoder parses that form back with
//! `roxmltree`. A field element that is absent decodes to the field's null
//! value, so nullable values round-trip without an explicit nil marker.
//!
//! Arrays are repeated elements of the field name. An empty array therefore
//! renders the same as a null one and decodes as null; callers that must
//! keep the distinction use the binary form.

use std::{fmt::Write as _, str::FromStr, sync::Arc};

use chrono::Utc;
use roxmltree::{Document, Node};

use crate::{
    basic_types::{LocalizedText, QualifiedName},
    bitmask::EnumSet,
    byte_string::ByteString,
    date_time::DateTime,
    descriptor::{FieldDescriptor, FieldKind, TypeDescriptor},
    diagnostic_info::DiagnosticInfo,
    encoding::DecodingOptions,
    error::{CodecError, EncodingResult},
    extension_object::{ExtensionObject, ExtensionObjectBody},
    guid::Guid,
    node_id::{ExpandedNodeId, NodeId},
    registry::TypeRegistry,
    status_code::StatusCode,
    string::{UAString, XmlElement},
    value::{Structure, WireValue},
};

/// Appends `text` with the five XML special characters escaped.
fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
}

fn push_element(out: &mut String, tag: &str, body: impl FnOnce(&mut String)) {
    // A write! to a String cannot fail.
    let _ = write!(out, "<{}>", tag);
    body(out);
    let _ = write!(out, "</{}>", tag);
}

fn push_text_element(out: &mut String, tag: &str, text: &str) {
    push_element(out, tag, |out| push_escaped(out, text));
}

// xsd float lexical forms for the non-finite values.
fn format_f64(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        value.to_string()
    }
}

fn format_f32(value: f32) -> String {
    format_f64(f64::from(value))
}

/// Renders structures as XML text.
#[derive(Debug, Default)]
pub struct XmlEncoder;

impl XmlEncoder {
    pub fn new() -> XmlEncoder {
        XmlEncoder
    }

    /// Renders the structure as a single XML element named after its type.
    pub fn encode_structure(&self, structure: &Structure) -> EncodingResult<XmlElement> {
        let mut out = String::new();
        self.render_structure(structure, structure.name(), &mut out)
            .map_err(|e| e.at(structure.name()))?;
        Ok(XmlElement::from(out))
    }

    /// Renders the structure and wraps it in an extension object tagged
    /// with the type's xml encoding id.
    pub fn extension_object(&self, structure: &Structure) -> EncodingResult<ExtensionObject> {
        let encoding_id = structure.xml_encoding_id();
        if encoding_id.is_null() {
            error!("Type {} has no xml encoding id", structure.name());
            return Err(CodecError::UnsupportedField("xml encoding"));
        }
        Ok(ExtensionObject {
            type_id: encoding_id.clone(),
            body: ExtensionObjectBody::Xml(self.encode_structure(structure)?),
        })
    }

    fn render_structure(
        &self,
        structure: &Structure,
        tag: &str,
        out: &mut String,
    ) -> EncodingResult<()> {
        let _ = write!(out, "<{}>", tag);
        for (field, value) in structure.iter() {
            self.render_field(field, value, out)
                .map_err(|e| e.at(&field.name))?;
        }
        let _ = write!(out, "</{}>", tag);
        Ok(())
    }

    fn render_field(
        &self,
        field: &FieldDescriptor,
        value: &WireValue,
        out: &mut String,
    ) -> EncodingResult<()> {
        if field.array {
            return match value {
                WireValue::Null | WireValue::Array(None) => Ok(()),
                WireValue::Array(Some(elements)) => {
                    for element in elements {
                        self.render_scalar(&field.kind, element, &field.name, out)?;
                    }
                    Ok(())
                }
                other => Err(CodecError::FieldTypeMismatch {
                    expected: "Array",
                    actual: other.kind_name(),
                }),
            };
        }
        self.render_scalar(&field.kind, value, &field.name, out)
    }

    fn render_scalar(
        &self,
        kind: &FieldKind,
        value: &WireValue,
        tag: &str,
        out: &mut String,
    ) -> EncodingResult<()> {
        match (kind, value) {
            // Null renders as element absence for every kind.
            (_, WireValue::Null) => {}
            (FieldKind::Boolean, WireValue::Boolean(v)) => {
                push_text_element(out, tag, if *v { "true" } else { "false" })
            }
            (FieldKind::SByte, WireValue::SByte(v)) => push_text_element(out, tag, &v.to_string()),
            (FieldKind::Byte, WireValue::Byte(v)) => push_text_element(out, tag, &v.to_string()),
            (FieldKind::Int16, WireValue::Int16(v)) => push_text_element(out, tag, &v.to_string()),
            (FieldKind::UInt16, WireValue::UInt16(v)) => {
                push_text_element(out, tag, &v.to_string())
            }
            (FieldKind::Int32, WireValue::Int32(v)) => push_text_element(out, tag, &v.to_string()),
            (FieldKind::UInt32, WireValue::UInt32(v)) => {
                push_text_element(out, tag, &v.to_string())
            }
            (FieldKind::Int64, WireValue::Int64(v)) => push_text_element(out, tag, &v.to_string()),
            (FieldKind::UInt64, WireValue::UInt64(v)) => {
                push_text_element(out, tag, &v.to_string())
            }
            (FieldKind::Float, WireValue::Float(v)) => push_text_element(out, tag, &format_f32(*v)),
            (FieldKind::Double, WireValue::Double(v)) => {
                push_text_element(out, tag, &format_f64(*v))
            }
            (FieldKind::String, WireValue::String(v))
            | (FieldKind::XmlElement, WireValue::String(v)) => {
                if let Some(text) = v.value() {
                    push_text_element(out, tag, text);
                }
            }
            (FieldKind::ByteString, WireValue::ByteString(v)) => {
                if !v.is_null() {
                    push_text_element(out, tag, &v.as_base64());
                }
            }
            (FieldKind::Guid, WireValue::Guid(v)) => push_text_element(out, tag, &v.to_string()),
            (FieldKind::NodeId, WireValue::NodeId(v)) => {
                if !v.is_null() {
                    push_text_element(out, tag, &v.to_string());
                }
            }
            (FieldKind::ExpandedNodeId, WireValue::ExpandedNodeId(v)) => {
                if !v.is_null() {
                    push_text_element(out, tag, &v.to_string());
                }
            }
            (FieldKind::StatusCode, WireValue::StatusCode(v)) => {
                push_text_element(out, tag, &v.bits().to_string())
            }
            (FieldKind::DateTime, WireValue::DateTime(v)) => {
                push_text_element(out, tag, &v.as_chrono().to_rfc3339())
            }
            (FieldKind::QualifiedName, WireValue::QualifiedName(v)) => {
                if !v.is_null() {
                    push_element(out, tag, |out| {
                        let _ = write!(out, "<NamespaceIndex>{}</NamespaceIndex>", v.namespace_index);
                        if let Some(name) = v.name.value() {
                            push_text_element(out, "Name", name);
                        }
                    });
                }
            }
            (FieldKind::LocalizedText, WireValue::LocalizedText(v)) => {
                if !v.is_null() {
                    push_element(out, tag, |out| {
                        if let Some(locale) = v.locale.value() {
                            push_text_element(out, "Locale", locale);
                        }
                        if let Some(text) = v.text.value() {
                            push_text_element(out, "Text", text);
                        }
                    });
                }
            }
            (FieldKind::DiagnosticInfo, WireValue::DiagnosticInfo(v)) => {
                if !v.is_null() {
                    self.render_diagnostic_info(v, tag, out);
                }
            }
            (FieldKind::ExtensionObject, WireValue::ExtensionObject(v)) => {
                if !v.is_null() {
                    self.render_extension_object(v, tag, out);
                }
            }
            (FieldKind::EnumMask(_), WireValue::EnumSet(v)) => {
                push_text_element(out, tag, &v.mask().to_string())
            }
            (FieldKind::Struct(_), WireValue::Structure(v)) => {
                self.render_structure(v, tag, out)?;
            }
            (kind, value) => {
                return Err(CodecError::FieldTypeMismatch {
                    expected: kind.name(),
                    actual: value.kind_name(),
                })
            }
        }
        Ok(())
    }

    fn render_diagnostic_info(&self, info: &DiagnosticInfo, tag: &str, out: &mut String) {
        push_element(out, tag, |out| {
            if let Some(v) = info.symbolic_id {
                let _ = write!(out, "<SymbolicId>{}</SymbolicId>", v);
            }
            if let Some(v) = info.namespace_uri {
                let _ = write!(out, "<NamespaceUri>{}</NamespaceUri>", v);
            }
            if let Some(v) = info.locale {
                let _ = write!(out, "<Locale>{}</Locale>", v);
            }
            if let Some(v) = info.localized_text {
                let _ = write!(out, "<LocalizedText>{}</LocalizedText>", v);
            }
            if let Some(ref v) = info.additional_info {
                if let Some(text) = v.value() {
                    push_text_element(out, "AdditionalInfo", text);
                }
            }
            if let Some(v) = info.inner_status_code {
                let _ = write!(out, "<InnerStatusCode>{}</InnerStatusCode>", v.bits());
            }
            if let Some(ref inner) = info.inner_diagnostic_info {
                self.render_diagnostic_info(inner, "InnerDiagnosticInfo", out);
            }
        });
    }

    fn render_extension_object(&self, object: &ExtensionObject, tag: &str, out: &mut String) {
        push_element(out, tag, |out| {
            push_text_element(out, "TypeId", &object.type_id.to_string());
            match &object.body {
                ExtensionObjectBody::None => {}
                ExtensionObjectBody::Binary(bytes) => {
                    if !bytes.is_null() {
                        push_text_element(out, "Binary", &bytes.as_base64());
                    }
                }
                ExtensionObjectBody::Xml(xml) => {
                    if let Some(text) = xml.value() {
                        push_text_element(out, "Xml", text);
                    }
                }
            }
        });
    }
}

/// Parses the XML form back into structures, using the registry for schema
/// lookup.
pub struct XmlDecoder<'a> {
    registry: &'a TypeRegistry,
    options: DecodingOptions,
}

impl<'a> XmlDecoder<'a> {
    pub fn new(registry: &'a TypeRegistry, options: DecodingOptions) -> XmlDecoder<'a> {
        XmlDecoder { registry, options }
    }

    /// Parses one structure of the given type from XML text. The root
    /// element must be named after the type.
    pub fn decode_structure(&self, type_id: &NodeId, xml: &str) -> EncodingResult<Structure> {
        let descriptor = self.registry.lookup_by_type_id(type_id)?;
        if descriptor.is_abstract {
            return Err(CodecError::AbstractType(type_id.clone()));
        }
        let document =
            Document::parse(xml).map_err(|e| CodecError::MalformedXml(e.to_string()))?;
        let root = document.root_element();
        if root.tag_name().name() != descriptor.name {
            return Err(CodecError::MalformedXml(format!(
                "root element {} does not match type {}",
                root.tag_name().name(),
                descriptor.name
            )));
        }
        self.decode_node(descriptor, root).map_err(|e| e.at(&descriptor.name))
    }

    /// Resolves an extension object with an XML body against the registry.
    /// Unknown types keep the raw body.
    pub fn resolve_extension_object(
        &self,
        object: &ExtensionObject,
    ) -> EncodingResult<WireValue> {
        match &object.body {
            ExtensionObjectBody::Xml(xml) => {
                let descriptor = match self.registry.try_lookup_by_xml_id(&object.type_id) {
                    Some(descriptor) => descriptor.clone(),
                    None => {
                        debug!(
                            "Extension object type {} is unknown, keeping the raw body",
                            object.type_id
                        );
                        return Ok(WireValue::ExtensionObject(object.clone()));
                    }
                };
                let text = xml
                    .value()
                    .ok_or(CodecError::MalformedLength(-1))
                    .map_err(|e| e.at(&descriptor.name))?;
                Ok(WireValue::Structure(
                    self.decode_structure(&descriptor.type_id, text)?,
                ))
            }
            _ => Ok(WireValue::ExtensionObject(object.clone())),
        }
    }

    fn decode_node(
        &self,
        descriptor: &Arc<TypeDescriptor>,
        node: Node,
    ) -> EncodingResult<Structure> {
        let _depth_lock = self.options.depth_lock()?;
        let schema = self.registry.resolve_field_order(&descriptor.type_id)?;
        let mut values = Vec::with_capacity(schema.len());
        for field in schema.iter() {
            let value = self
                .decode_field(field, node)
                .map_err(|e| e.at(&field.name))?;
            values.push(value);
        }
        Ok(Structure::from_parts(
            descriptor.clone(),
            schema.clone(),
            values,
        ))
    }

    fn decode_field(&self, field: &FieldDescriptor, parent: Node) -> EncodingResult<WireValue> {
        if field.array {
            let elements: Vec<Node> = parent
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == field.name)
                .collect();
            if elements.is_empty() {
                return Ok(WireValue::Array(None));
            }
            if elements.len() > self.options.max_array_length {
                return Err(CodecError::LimitExceeded {
                    kind: "Array",
                    len: elements.len(),
                    max: self.options.max_array_length,
                });
            }
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                values.push(self.decode_scalar(&field.kind, element)?);
            }
            return Ok(WireValue::Array(Some(values)));
        }
        match child_element(parent, &field.name) {
            Some(node) => self.decode_scalar(&field.kind, node),
            None => Ok(WireValue::default_for(field)),
        }
    }

    fn decode_scalar(&self, kind: &FieldKind, node: Node) -> EncodingResult<WireValue> {
        let text = node.text().unwrap_or("");
        Ok(match kind {
            FieldKind::Boolean => WireValue::Boolean(match text.trim() {
                "true" | "1" => true,
                "false" | "0" | "" => false,
                other => {
                    return Err(CodecError::MalformedXml(format!(
                        "{} is not a boolean",
                        other
                    )))
                }
            }),
            FieldKind::SByte => WireValue::SByte(parse_number(text)?),
            FieldKind::Byte => WireValue::Byte(parse_number(text)?),
            FieldKind::Int16 => WireValue::Int16(parse_number(text)?),
            FieldKind::UInt16 => WireValue::UInt16(parse_number(text)?),
            FieldKind::Int32 => WireValue::Int32(parse_number(text)?),
            FieldKind::UInt32 => WireValue::UInt32(parse_number(text)?),
            FieldKind::Int64 => WireValue::Int64(parse_number(text)?),
            FieldKind::UInt64 => WireValue::UInt64(parse_number(text)?),
            FieldKind::Float => WireValue::Float(parse_f64(text)? as f32),
            FieldKind::Double => WireValue::Double(parse_f64(text)?),
            FieldKind::String | FieldKind::XmlElement => {
                if text.len() > self.options.max_string_length {
                    return Err(CodecError::LimitExceeded {
                        kind: "String",
                        len: text.len(),
                        max: self.options.max_string_length,
                    });
                }
                WireValue::String(UAString::from(text))
            }
            FieldKind::ByteString => {
                let bytes = ByteString::from_base64(text.trim())
                    .ok_or_else(|| CodecError::MalformedXml("invalid base64".to_string()))?;
                if bytes.len() as usize > self.options.max_byte_string_length {
                    return Err(CodecError::LimitExceeded {
                        kind: "ByteString",
                        len: bytes.len() as usize,
                        max: self.options.max_byte_string_length,
                    });
                }
                WireValue::ByteString(bytes)
            }
            FieldKind::Guid => WireValue::Guid(
                Guid::from_str(text.trim())
                    .map_err(|_| CodecError::MalformedXml(format!("{} is not a guid", text)))?,
            ),
            FieldKind::NodeId => WireValue::NodeId(NodeId::from_str(text.trim())?),
            FieldKind::ExpandedNodeId => {
                WireValue::ExpandedNodeId(ExpandedNodeId::from_str(text.trim())?)
            }
            FieldKind::StatusCode => {
                WireValue::StatusCode(StatusCode::from_bits(parse_number(text)?))
            }
            FieldKind::DateTime => {
                let parsed = chrono::DateTime::parse_from_rfc3339(text.trim()).map_err(|e| {
                    CodecError::MalformedXml(format!("{} is not a date time - {}", text, e))
                })?;
                WireValue::DateTime(DateTime::from(parsed.with_timezone(&Utc)))
            }
            FieldKind::QualifiedName => {
                let namespace_index = match child_element(node, "NamespaceIndex") {
                    Some(n) => parse_number(n.text().unwrap_or(""))?,
                    None => 0,
                };
                let name = match child_element(node, "Name") {
                    Some(n) => UAString::from(n.text().unwrap_or("")),
                    None => UAString::null(),
                };
                WireValue::QualifiedName(QualifiedName::new(namespace_index, name))
            }
            FieldKind::LocalizedText => {
                let locale = match child_element(node, "Locale") {
                    Some(n) => UAString::from(n.text().unwrap_or("")),
                    None => UAString::null(),
                };
                let text = match child_element(node, "Text") {
                    Some(n) => UAString::from(n.text().unwrap_or("")),
                    None => UAString::null(),
                };
                WireValue::LocalizedText(LocalizedText { locale, text })
            }
            FieldKind::DiagnosticInfo => {
                WireValue::DiagnosticInfo(Box::new(self.decode_diagnostic_info(node)?))
            }
            FieldKind::ExtensionObject => {
                WireValue::ExtensionObject(self.decode_extension_object(node)?)
            }
            FieldKind::EnumMask(name) => {
                let descriptor = self.registry.lookup_enum(name)?;
                WireValue::EnumSet(EnumSet::from_mask(descriptor.clone(), parse_number(text)?))
            }
            FieldKind::Struct(type_id) => {
                let descriptor = self.registry.lookup_by_type_id(type_id)?.clone();
                WireValue::Structure(self.decode_node(&descriptor, node)?)
            }
        })
    }

    fn decode_diagnostic_info(&self, node: Node) -> EncodingResult<DiagnosticInfo> {
        let _depth_lock = self.options.depth_lock()?;
        let index = |name: &str| -> EncodingResult<Option<i32>> {
            match child_element(node, name) {
                Some(n) => Ok(Some(parse_number(n.text().unwrap_or(""))?)),
                None => Ok(None),
            }
        };
        Ok(DiagnosticInfo {
            symbolic_id: index("SymbolicId")?,
            namespace_uri: index("NamespaceUri")?,
            locale: index("Locale")?,
            localized_text: index("LocalizedText")?,
            additional_info: child_element(node, "AdditionalInfo")
                .map(|n| UAString::from(n.text().unwrap_or(""))),
            inner_status_code: match child_element(node, "InnerStatusCode") {
                Some(n) => Some(StatusCode::from_bits(parse_number(n.text().unwrap_or(""))?)),
                None => None,
            },
            inner_diagnostic_info: match child_element(node, "InnerDiagnosticInfo") {
                Some(n) => Some(Box::new(self.decode_diagnostic_info(n)?)),
                None => None,
            },
        })
    }

    fn decode_extension_object(&self, node: Node) -> EncodingResult<ExtensionObject> {
        let type_id = match child_element(node, "TypeId") {
            Some(n) => NodeId::from_str(n.text().unwrap_or("").trim())?,
            None => NodeId::null(),
        };
        let body = if let Some(n) = child_element(node, "Binary") {
            let bytes = ByteString::from_base64(n.text().unwrap_or("").trim())
                .ok_or_else(|| CodecError::MalformedXml("invalid base64".to_string()))?;
            ExtensionObjectBody::Binary(bytes)
        } else if let Some(n) = child_element(node, "Xml") {
            ExtensionObjectBody::Xml(XmlElement::from(n.text().unwrap_or("")))
        } else {
            ExtensionObjectBody::None
        };
        Ok(ExtensionObject { type_id, body })
    }
}

fn child_element<'a, 'input>(parent: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    parent
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn parse_number<T: FromStr>(text: &str) -> EncodingResult<T> {
    text.trim()
        .parse()
        .map_err(|_| CodecError::MalformedXml(format!("{} is not a valid number", text)))
}

fn parse_f64(text: &str) -> EncodingResult<f64> {
    match text.trim() {
        "INF" | "+INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        other => other
            .parse()
            .map_err(|_| CodecError::MalformedXml(format!("{} is not a valid number", text))),
    }
}
