// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `ByteString`.

use std::{
    fmt,
    io::{Read, Write},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::encoding::{
    read_exact, read_length_prefix, write_all, write_i32, BinaryCodable, DecodingOptions,
    EncodingResult,
};

/// A sequence of octets with the same null/empty distinction as `UAString`.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct ByteString {
    value: Option<Vec<u8>>,
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

impl BinaryCodable for ByteString {
    fn byte_len(&self) -> usize {
        4 + self.value.as_ref().map_or(0, |v| v.len())
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        match self.value {
            None => write_i32(stream, -1),
            Some(ref value) => {
                let mut size = write_i32(stream, value.len() as i32)?;
                size += write_all(stream, value)?;
                Ok(size)
            }
        }
    }

    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self> {
        let len = match read_length_prefix(stream, "ByteString", options.max_byte_string_length)? {
            None => return Ok(ByteString::null()),
            Some(len) => len,
        };
        let mut buf = vec![0u8; len];
        read_exact(stream, &mut buf)?;
        Ok(ByteString { value: Some(buf) })
    }
}

impl Serialize for ByteString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value {
            Some(_) => serializer.serialize_str(&self.as_base64()),
            None => serializer.serialize_none(),
        }
    }
}

struct ByteStringVisitor;

impl<'de> de::Visitor<'de> for ByteStringVisitor {
    type Value = ByteString;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "a base64 encoded string value or null")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ByteString::null())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        ByteString::from_base64(v).ok_or_else(|| de::Error::custom("cannot decode base64"))
    }
}

impl<'de> Deserialize<'de> for ByteString {
    fn deserialize<D>(deserializer: D) -> Result<ByteString, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(ByteStringVisitor)
    }
}

impl<T> From<&[T]> for ByteString
where
    T: Into<u8> + Copy,
{
    fn from(value: &[T]) -> Self {
        ByteString {
            value: Some(value.iter().map(|v| (*v).into()).collect()),
        }
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        ByteString { value: Some(value) }
    }
}

impl ByteString {
    /// A null byte string, which is not the same as an empty one.
    pub fn null() -> ByteString {
        ByteString { value: None }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map_or(true, |v| v.is_empty())
    }

    pub fn len(&self) -> isize {
        self.value.as_ref().map_or(-1, |v| v.len() as isize)
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// Creates a byte string from its base64 representation.
    pub fn from_base64(data: &str) -> Option<ByteString> {
        STANDARD.decode(data).map(ByteString::from).ok()
    }

    /// The base64 representation of the bytes; null encodes as empty.
    pub fn as_base64(&self) -> String {
        STANDARD.encode(self.as_ref())
    }
}

#[test]
fn byte_string_base64() {
    let b = ByteString::from(vec![0x01u8, 0x02, 0x03, 0x04]);
    let base64 = b.as_base64();
    assert_eq!(base64, "AQIDBA==");
    assert_eq!(ByteString::from_base64(&base64).unwrap(), b);
    assert!(ByteString::from_base64("!!not base64!!").is_none());
}
