// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `UAString`.

use std::{
    fmt,
    io::{Read, Write},
};

use crate::{
    encoding::{
        read_exact, read_length_prefix, write_all, write_i32, BinaryCodable, DecodingOptions,
        EncodingResult,
    },
    error::CodecError,
};

/// The OPC UA String type, named `UAString` to avoid colliding with the Rust
/// `String`.
///
/// A wire string is UTF-8 and may be null. Null is distinct from empty, so
/// the value is held as an `Option<String>` to keep that distinction.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, Serialize, Deserialize)]
pub struct UAString {
    value: Option<String>,
}

impl fmt::Display for UAString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(ref value) => write!(f, "{}", value),
            None => write!(f, "[null]"),
        }
    }
}

impl BinaryCodable for UAString {
    fn byte_len(&self) -> usize {
        4 + self.value.as_ref().map_or(0, |v| v.len())
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        // Int32 byte length then the UTF-8 bytes; -1 is a null string.
        match self.value {
            None => write_i32(stream, -1),
            Some(ref value) => {
                let mut size = write_i32(stream, value.len() as i32)?;
                size += write_all(stream, value.as_bytes())?;
                Ok(size)
            }
        }
    }

    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self> {
        let len = match read_length_prefix(stream, "String", options.max_string_length)? {
            None => return Ok(UAString::null()),
            Some(len) => len,
        };
        let mut buf = vec![0u8; len];
        read_exact(stream, &mut buf)?;
        let value = String::from_utf8(buf).map_err(|err| {
            trace!("Decoded string was not valid UTF-8 - {}", err);
            CodecError::InvalidUtf8
        })?;
        Ok(UAString::from(value))
    }
}

impl From<&str> for UAString {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<&String> for UAString {
    fn from(value: &String) -> Self {
        Self::from(value.clone())
    }
}

impl From<String> for UAString {
    fn from(value: String) -> Self {
        UAString { value: Some(value) }
    }
}

impl From<UAString> for String {
    fn from(value: UAString) -> Self {
        value.as_ref().to_string()
    }
}

impl AsRef<str> for UAString {
    fn as_ref(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl PartialEq<str> for UAString {
    fn eq(&self, other: &str) -> bool {
        match self.value {
            Some(ref v) => v == other,
            None => false,
        }
    }
}

impl UAString {
    /// A null string, which is not the same as an empty string.
    pub fn null() -> UAString {
        UAString { value: None }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// True if the string is null or has no characters.
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map_or(true, |v| v.is_empty())
    }

    /// The length of the string in bytes, or -1 for null.
    pub fn len(&self) -> isize {
        self.value.as_ref().map_or(-1, |v| v.len() as isize)
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }
}

/// An XML element, held as raw text.
pub type XmlElement = UAString;

#[test]
fn string_null() {
    let s = UAString::null();
    assert!(s.is_null());
    assert!(s.is_empty());
    assert_eq!(s.len(), -1);
}

#[test]
fn string_empty_is_not_null() {
    let s = UAString::from("");
    assert!(!s.is_null());
    assert!(s.is_empty());
    assert_eq!(s.len(), 0);
}

#[test]
fn string_eq() {
    assert!(!UAString::null().eq(""));
    assert!(UAString::from("").eq(""));
    assert!(UAString::from("Sunshine").eq("Sunshine"));
    assert!(UAString::from("Sunshine").ne("Moonshine"));
}
