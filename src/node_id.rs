// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `NodeId` and `ExpandedNodeId`, the
//! namespace-qualified identifiers every type and encoding is keyed by.

use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

use crate::{
    byte_string::ByteString,
    encoding::{
        read_u16, read_u32, read_u8, write_u16, write_u32, write_u8, BinaryCodable,
        DecodingOptions, EncodingResult,
    },
    error::CodecError,
    guid::Guid,
    string::UAString,
};

// Leading tag byte values of the binary NodeId encoding.
const TAG_TWO_BYTE: u8 = 0x00;
const TAG_FOUR_BYTE: u8 = 0x01;
const TAG_NUMERIC: u8 = 0x02;
const TAG_STRING: u8 = 0x03;
const TAG_GUID: u8 = 0x04;
const TAG_BYTE_STRING: u8 = 0x05;
// ExpandedNodeId flag bits OR-ed into the tag byte.
const FLAG_NAMESPACE_URI: u8 = 0x80;
const FLAG_SERVER_INDEX: u8 = 0x40;

/// The kind of identifier: numeric, string, guid or opaque bytes.
#[derive(Eq, PartialEq, Clone, Debug, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(UAString),
    Guid(Guid),
    ByteString(ByteString),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={}", v),
            Identifier::String(v) => write!(f, "s={}", v),
            Identifier::Guid(v) => write!(f, "g={:?}", v),
            Identifier::ByteString(v) => write!(f, "b={}", v.as_base64()),
        }
    }
}

impl FromStr for Identifier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 2 {
            return Err(());
        }
        let (k, v) = s.split_at(2);
        match k {
            "i=" => v.parse::<u32>().map(Identifier::Numeric).map_err(|_| ()),
            "s=" => Ok(Identifier::String(UAString::from(v))),
            "g=" => Guid::from_str(v).map(Identifier::Guid).map_err(|_| ()),
            "b=" => ByteString::from_base64(v)
                .map(Identifier::ByteString)
                .ok_or(()),
            _ => Err(()),
        }
    }
}

impl From<u32> for Identifier {
    fn from(v: u32) -> Self {
        Identifier::Numeric(v)
    }
}

impl From<&str> for Identifier {
    fn from(v: &str) -> Self {
        Identifier::String(UAString::from(v))
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::String(UAString::from(v))
    }
}

impl From<UAString> for Identifier {
    fn from(v: UAString) -> Self {
        Identifier::String(v)
    }
}

impl From<Guid> for Identifier {
    fn from(v: Guid) -> Self {
        Identifier::Guid(v)
    }
}

impl From<ByteString> for Identifier {
    fn from(v: ByteString) -> Self {
        Identifier::ByteString(v)
    }
}

/// The identifier of a node, and in this crate specifically of a type or
/// one of its encodings.
#[derive(Eq, PartialEq, Clone, Debug, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// The index of the namespace the identifier belongs to.
    pub namespace: u16,
    /// The identifier within that namespace.
    pub identifier: Identifier,
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};{}", self.namespace, self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

impl BinaryCodable for NodeId {
    fn byte_len(&self) -> usize {
        match &self.identifier {
            Identifier::Numeric(value) => {
                if self.namespace == 0 && *value <= 255 {
                    2
                } else if self.namespace <= 255 && *value <= 65535 {
                    4
                } else {
                    7
                }
            }
            Identifier::String(value) => 3 + value.byte_len(),
            Identifier::Guid(value) => 3 + value.byte_len(),
            Identifier::ByteString(value) => 3 + value.byte_len(),
        }
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        self.encode_with_flags(stream, 0)
    }

    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self> {
        let tag = read_u8(stream)?;
        Self::decode_body(stream, options, tag, 0)
    }
}

impl FromStr for NodeId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use regex::Regex;

        // ns=<namespaceindex>;<type>=<value> where the ns= part is omitted
        // for namespace 0 (OPC UA Part 6, 5.3.1.10).
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^(ns=(?P<ns>[0-9]+);)?(?P<t>[isgb]=.+)$").unwrap();
        }

        let captures = RE
            .captures(s)
            .ok_or_else(|| CodecError::OutOfRange(format!("{} is not a node id", s)))?;

        let namespace = match captures.name("ns") {
            Some(ns) => ns
                .as_str()
                .parse::<u16>()
                .map_err(|_| CodecError::OutOfRange(format!("bad namespace in {}", s)))?,
            None => 0,
        };

        let t = captures.name("t").unwrap();
        Identifier::from_str(t.as_str())
            .map(|t| NodeId::new(namespace, t))
            .map_err(|_| CodecError::OutOfRange(format!("bad identifier in {}", s)))
    }
}

impl From<(u16, u32)> for NodeId {
    fn from(v: (u16, u32)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<(u16, &str)> for NodeId {
    fn from(v: (u16, &str)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<&NodeId> for NodeId {
    fn from(v: &NodeId) -> Self {
        v.clone()
    }
}

impl NodeId {
    pub fn new<T>(namespace: u16, value: T) -> NodeId
    where
        T: Into<Identifier>,
    {
        NodeId {
            namespace,
            identifier: value.into(),
        }
    }

    /// The null node id, namespace 0 and numeric id 0.
    pub fn null() -> NodeId {
        NodeId::new(0, 0u32)
    }

    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.identifier, Identifier::Numeric(_))
    }

    /// Encodes the node id choosing the most compact tag, with the supplied
    /// expanded-form flag bits OR-ed into the tag byte.
    fn encode_with_flags<S: Write>(&self, stream: &mut S, flags: u8) -> EncodingResult<usize> {
        let mut size = 0;
        match &self.identifier {
            Identifier::Numeric(value) => {
                if self.namespace == 0 && *value <= 255 {
                    size += write_u8(stream, TAG_TWO_BYTE | flags)?;
                    size += write_u8(stream, *value as u8)?;
                } else if self.namespace <= 255 && *value <= 65535 {
                    size += write_u8(stream, TAG_FOUR_BYTE | flags)?;
                    size += write_u8(stream, self.namespace as u8)?;
                    size += write_u16(stream, *value as u16)?;
                } else {
                    size += write_u8(stream, TAG_NUMERIC | flags)?;
                    size += write_u16(stream, self.namespace)?;
                    size += write_u32(stream, *value)?;
                }
            }
            Identifier::String(value) => {
                size += write_u8(stream, TAG_STRING | flags)?;
                size += write_u16(stream, self.namespace)?;
                size += value.encode(stream)?;
            }
            Identifier::Guid(value) => {
                size += write_u8(stream, TAG_GUID | flags)?;
                size += write_u16(stream, self.namespace)?;
                size += value.encode(stream)?;
            }
            Identifier::ByteString(value) => {
                size += write_u8(stream, TAG_BYTE_STRING | flags)?;
                size += write_u16(stream, self.namespace)?;
                size += value.encode(stream)?;
            }
        }
        Ok(size)
    }

    /// Decodes the body following an already-read tag byte. Shared with
    /// `ExpandedNodeId`, which passes the flag bits its tag may legally
    /// carry; any other bit outside the identifier kind is an encoding
    /// error.
    fn decode_body<S: Read>(
        stream: &mut S,
        options: &DecodingOptions,
        tag: u8,
        flags: u8,
    ) -> EncodingResult<NodeId> {
        let node_id = match tag & !flags {
            TAG_TWO_BYTE => {
                let value = read_u8(stream)?;
                NodeId::new(0, u32::from(value))
            }
            TAG_FOUR_BYTE => {
                let namespace = read_u8(stream)?;
                let value = read_u16(stream)?;
                NodeId::new(u16::from(namespace), u32::from(value))
            }
            TAG_NUMERIC => {
                let namespace = read_u16(stream)?;
                let value = read_u32(stream)?;
                NodeId::new(namespace, value)
            }
            TAG_STRING => {
                let namespace = read_u16(stream)?;
                let value = UAString::decode(stream, options)?;
                NodeId::new(namespace, value)
            }
            TAG_GUID => {
                let namespace = read_u16(stream)?;
                let value = Guid::decode(stream, options)?;
                NodeId::new(namespace, value)
            }
            TAG_BYTE_STRING => {
                let namespace = read_u16(stream)?;
                let value = ByteString::decode(stream, options)?;
                NodeId::new(namespace, value)
            }
            _ => {
                error!("Unrecognized node id tag 0x{:02x}", tag);
                return Err(CodecError::InvalidIdentifierEncoding(tag));
            }
        };
        Ok(node_id)
    }
}

/// A `NodeId` optionally qualified with a namespace URI and/or the index of
/// the server the node lives on.
#[derive(Eq, PartialEq, Clone, Debug, Hash, Serialize, Deserialize)]
pub struct ExpandedNodeId {
    pub node_id: NodeId,
    pub namespace_uri: UAString,
    pub server_index: u32,
}

impl Default for ExpandedNodeId {
    fn default() -> Self {
        ExpandedNodeId::null()
    }
}

impl From<NodeId> for ExpandedNodeId {
    fn from(node_id: NodeId) -> Self {
        ExpandedNodeId {
            node_id,
            namespace_uri: UAString::null(),
            server_index: 0,
        }
    }
}

impl fmt::Display for ExpandedNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_uri.is_empty() {
            write!(f, "svr={};{}", self.server_index, self.node_id)
        } else {
            // The % and ; characters are escaped inside the uri.
            let uri = self
                .namespace_uri
                .as_ref()
                .replace('%', "%25")
                .replace(';', "%3b");
            write!(
                f,
                "svr={};nsu={};{}",
                self.server_index, uri, self.node_id.identifier
            )
        }
    }
}

impl FromStr for ExpandedNodeId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use regex::Regex;

        // svr=<serverindex>;[ns=<namespaceindex>;|nsu=<uri>;]<type>=<value>
        // (OPC UA Part 6, 5.3.1.11). The namespace part is absent for
        // namespace 0.
        lazy_static! {
            static ref RE: Regex = Regex::new(
                r"^svr=(?P<svr>[0-9]+);(ns=(?P<ns>[0-9]+);|nsu=(?P<nsu>[^;]+);)?(?P<t>[isgb]=.+)$"
            )
            .unwrap();
        }

        let captures = RE
            .captures(s)
            .ok_or_else(|| CodecError::OutOfRange(format!("{} is not an expanded node id", s)))?;

        let server_index = captures
            .name("svr")
            .unwrap()
            .as_str()
            .parse::<u32>()
            .map_err(|_| CodecError::OutOfRange(format!("bad server index in {}", s)))?;

        let namespace_uri = match captures.name("nsu") {
            Some(nsu) => {
                let nsu = nsu.as_str().replace("%3b", ";").replace("%25", "%");
                UAString::from(nsu)
            }
            None => UAString::null(),
        };

        let namespace = match captures.name("ns") {
            Some(ns) => ns
                .as_str()
                .parse::<u16>()
                .map_err(|_| CodecError::OutOfRange(format!("bad namespace in {}", s)))?,
            None => 0,
        };

        let t = captures.name("t").unwrap();
        Identifier::from_str(t.as_str())
            .map(|t| ExpandedNodeId {
                server_index,
                namespace_uri,
                node_id: NodeId::new(namespace, t),
            })
            .map_err(|_| CodecError::OutOfRange(format!("bad identifier in {}", s)))
    }
}

impl BinaryCodable for ExpandedNodeId {
    fn byte_len(&self) -> usize {
        let mut size = self.node_id.byte_len();
        if !self.namespace_uri.is_null() {
            size += self.namespace_uri.byte_len();
        }
        if self.server_index != 0 {
            size += 4;
        }
        size
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut flags = 0;
        if !self.namespace_uri.is_null() {
            flags |= FLAG_NAMESPACE_URI;
        }
        if self.server_index != 0 {
            flags |= FLAG_SERVER_INDEX;
        }
        let mut size = self.node_id.encode_with_flags(stream, flags)?;
        if !self.namespace_uri.is_null() {
            size += self.namespace_uri.encode(stream)?;
        }
        if self.server_index != 0 {
            size += write_u32(stream, self.server_index)?;
        }
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self> {
        let tag = read_u8(stream)?;
        let node_id =
            NodeId::decode_body(stream, options, tag, FLAG_NAMESPACE_URI | FLAG_SERVER_INDEX)?;
        let namespace_uri = if tag & FLAG_NAMESPACE_URI != 0 {
            UAString::decode(stream, options)?
        } else {
            UAString::null()
        };
        let server_index = if tag & FLAG_SERVER_INDEX != 0 {
            read_u32(stream)?
        } else {
            0
        };
        Ok(ExpandedNodeId {
            node_id,
            namespace_uri,
            server_index,
        })
    }
}

impl ExpandedNodeId {
    pub fn new<T>(value: T) -> ExpandedNodeId
    where
        T: Into<ExpandedNodeId>,
    {
        value.into()
    }

    pub fn null() -> ExpandedNodeId {
        Self::new(NodeId::null())
    }

    pub fn is_null(&self) -> bool {
        self.node_id.is_null()
    }
}
