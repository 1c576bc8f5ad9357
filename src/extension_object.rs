// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `ExtensionObject`, the type-tagged and
//! possibly opaque payload behind every polymorphic field.
//!
//! The wire form keeps the body raw. A reader that knows the type id can
//! resolve the body into a structure on first typed access (see
//! `BinaryDecoder::resolve_extension_object`); a reader that does not keeps
//! the bytes and can relay them unchanged.

use std::io::{Cursor, Read, Write};

use crate::{
    byte_string::ByteString,
    encoding::{read_u8, write_u8, BinaryCodable, DecodingOptions, EncodingResult},
    error::CodecError,
    node_id::NodeId,
    string::XmlElement,
};

// Body kind selector byte values.
const BODY_NONE: u8 = 0x00;
const BODY_BINARY: u8 = 0x01;
const BODY_XML: u8 = 0x02;

/// The three body kinds an extension object may carry.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub enum ExtensionObjectBody {
    /// No payload at all.
    None,
    /// A binary payload, opaque until resolved against a registry.
    Binary(ByteString),
    /// An XML payload, kept as raw text.
    Xml(XmlElement),
}

/// A serialized value identified by the node id of its encoding. Values of
/// types unknown to the local registry round-trip byte-for-byte.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct ExtensionObject {
    /// The binary or xml encoding id of the wrapped type.
    pub type_id: NodeId,
    pub body: ExtensionObjectBody,
}

impl Default for ExtensionObject {
    fn default() -> Self {
        Self::null()
    }
}

impl BinaryCodable for ExtensionObject {
    fn byte_len(&self) -> usize {
        let mut size = self.type_id.byte_len();
        size += match self.body {
            ExtensionObjectBody::None => 1,
            ExtensionObjectBody::Binary(ref value) => 1 + value.byte_len(),
            ExtensionObjectBody::Xml(ref value) => 1 + value.byte_len(),
        };
        size
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut size = self.type_id.encode(stream)?;
        match self.body {
            ExtensionObjectBody::None => {
                size += write_u8(stream, BODY_NONE)?;
            }
            ExtensionObjectBody::Binary(ref value) => {
                size += write_u8(stream, BODY_BINARY)?;
                size += value.encode(stream)?;
            }
            ExtensionObjectBody::Xml(ref value) => {
                size += write_u8(stream, BODY_XML)?;
                size += value.encode(stream)?;
            }
        }
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self> {
        // Depth checked; extension objects may nest via their payloads.
        let _depth_lock = options.depth_lock()?;
        let type_id = NodeId::decode(stream, options)?;
        let body = match read_u8(stream)? {
            BODY_NONE => ExtensionObjectBody::None,
            BODY_BINARY => ExtensionObjectBody::Binary(ByteString::decode(stream, options)?),
            BODY_XML => ExtensionObjectBody::Xml(XmlElement::decode(stream, options)?),
            selector => {
                error!("Invalid extension object body selector {}", selector);
                return Err(CodecError::InvalidIdentifierEncoding(selector));
            }
        };
        Ok(ExtensionObject { type_id, body })
    }
}

impl ExtensionObject {
    /// A null extension object: null type id, no body.
    pub fn null() -> ExtensionObject {
        ExtensionObject {
            type_id: NodeId::null(),
            body: ExtensionObjectBody::None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.type_id.is_null()
    }

    pub fn is_empty(&self) -> bool {
        self.is_null() || matches!(self.body, ExtensionObjectBody::None)
    }

    /// Wraps any binary-codable value under the supplied encoding id.
    pub fn from_codable<N, T>(type_id: N, value: &T) -> EncodingResult<ExtensionObject>
    where
        N: Into<NodeId>,
        T: BinaryCodable,
    {
        Ok(ExtensionObject {
            type_id: type_id.into(),
            body: ExtensionObjectBody::Binary(ByteString::from(value.encode_to_vec()?)),
        })
    }

    /// Decodes the binary body as `T`, ignoring the type id. The caller
    /// chooses the type; a none or xml body is a decoding error.
    pub fn decode_inner<T>(&self, options: &DecodingOptions) -> EncodingResult<T>
    where
        T: BinaryCodable,
    {
        match self.body {
            ExtensionObjectBody::Binary(ref bytes) => match bytes.value() {
                Some(value) => {
                    let mut stream = Cursor::new(value);
                    let decoded = T::decode(&mut stream, options)?;
                    let consumed = stream.position() as usize;
                    if consumed < value.len() {
                        return Err(CodecError::TrailingBytes(value.len() - consumed));
                    }
                    Ok(decoded)
                }
                None => Err(CodecError::MalformedLength(-1)),
            },
            _ => {
                error!("decode_inner called on an extension object without a binary body");
                Err(CodecError::UnsupportedField("ExtensionObject"))
            }
        }
    }
}

#[test]
fn decode_inner_consumes_the_whole_body() {
    let object = ExtensionObject::from_codable(NodeId::new(0, 5u32), &13u32).unwrap();
    assert_eq!(
        object.decode_inner::<u32>(&DecodingOptions::test()).unwrap(),
        13
    );

    let padded = ExtensionObject {
        type_id: NodeId::new(0, 5u32),
        body: ExtensionObjectBody::Binary(ByteString::from(vec![0x0d, 0x00, 0x00, 0x00, 0xaa])),
    };
    let err = padded
        .decode_inner::<u32>(&DecodingOptions::test())
        .unwrap_err();
    assert!(matches!(err, CodecError::TrailingBytes(1)));
}
