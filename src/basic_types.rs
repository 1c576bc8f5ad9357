// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the definitions of `QualifiedName` and `LocalizedText`.

use std::{
    fmt,
    io::{Read, Write},
};

use crate::{
    encoding::{read_u8, write_u8, BinaryCodable, DecodingOptions, EncodingResult},
    string::UAString,
};

/// A name qualified by a namespace index.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, Serialize, Deserialize)]
pub struct QualifiedName {
    pub namespace_index: u16,
    pub name: UAString,
}

impl BinaryCodable for QualifiedName {
    fn byte_len(&self) -> usize {
        self.namespace_index.byte_len() + self.name.byte_len()
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut size = self.namespace_index.encode(stream)?;
        size += self.name.encode(stream)?;
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self> {
        let namespace_index = u16::decode(stream, options)?;
        let name = UAString::decode(stream, options)?;
        Ok(QualifiedName {
            namespace_index,
            name,
        })
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        Self {
            namespace_index: 0,
            name: UAString::from(value),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "{}:{}", self.namespace_index, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl QualifiedName {
    pub fn new<T>(namespace_index: u16, name: T) -> QualifiedName
    where
        T: Into<UAString>,
    {
        QualifiedName {
            namespace_index,
            name: name.into(),
        }
    }

    pub fn null() -> QualifiedName {
        QualifiedName {
            namespace_index: 0,
            name: UAString::null(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && self.name.is_null()
    }
}

/// Human readable text with an optional locale identifier.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    /// The locale. Omitted from the stream when null or empty.
    pub locale: UAString,
    /// The text in that locale. Omitted from the stream when null or empty.
    pub text: UAString,
}

// Presence bits of the leading mask byte.
const HAS_LOCALE: u8 = 0x1;
const HAS_TEXT: u8 = 0x2;

impl BinaryCodable for LocalizedText {
    fn byte_len(&self) -> usize {
        let mut size = 1;
        if !self.locale.is_empty() {
            size += self.locale.byte_len();
        }
        if !self.text.is_empty() {
            size += self.text.byte_len();
        }
        size
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut mask = 0u8;
        if !self.locale.is_empty() {
            mask |= HAS_LOCALE;
        }
        if !self.text.is_empty() {
            mask |= HAS_TEXT;
        }
        let mut size = write_u8(stream, mask)?;
        if !self.locale.is_empty() {
            size += self.locale.encode(stream)?;
        }
        if !self.text.is_empty() {
            size += self.text.encode(stream)?;
        }
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self> {
        let mask = read_u8(stream)?;
        let locale = if mask & HAS_LOCALE != 0 {
            UAString::decode(stream, options)?
        } else {
            UAString::null()
        };
        let text = if mask & HAS_TEXT != 0 {
            UAString::decode(stream, options)?
        } else {
            UAString::null()
        };
        Ok(LocalizedText { locale, text })
    }
}

impl From<&str> for LocalizedText {
    fn from(value: &str) -> Self {
        Self {
            locale: UAString::null(),
            text: UAString::from(value),
        }
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl LocalizedText {
    pub fn new(locale: &str, text: &str) -> LocalizedText {
        LocalizedText {
            locale: UAString::from(locale),
            text: UAString::from(text),
        }
    }

    pub fn null() -> LocalizedText {
        LocalizedText {
            locale: UAString::null(),
            text: UAString::null(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.locale.is_null() && self.text.is_null()
    }
}
