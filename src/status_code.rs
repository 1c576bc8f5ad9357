// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `StatusCode`, the per-operation outcome
//! code used throughout the protocol's batched responses.

use std::{
    fmt,
    io::{Read, Write},
};

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::encoding::{read_u32, write_u32, BinaryCodable, DecodingOptions, EncodingResult};

const SEVERITY_BAD: u32 = 0x8000_0000;
const SEVERITY_UNCERTAIN: u32 = 0x4000_0000;

/// A 32-bit operation result. The top two bits carry the severity, the rest
/// identifies the condition. Codes received from a peer are preserved even
/// when this crate does not know a name for them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct StatusCode(u32);

impl StatusCode {
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);
    pub const BAD_UNEXPECTED_ERROR: StatusCode = StatusCode(0x8001_0000);
    pub const BAD_ENCODING_ERROR: StatusCode = StatusCode(0x8006_0000);
    pub const BAD_DECODING_ERROR: StatusCode = StatusCode(0x8007_0000);
    pub const BAD_ENCODING_LIMITS_EXCEEDED: StatusCode = StatusCode(0x8008_0000);
    pub const BAD_DATA_TYPE_ID_UNKNOWN: StatusCode = StatusCode(0x8011_0000);
    pub const BAD_DATA_ENCODING_UNSUPPORTED: StatusCode = StatusCode(0x8039_0000);
    pub const BAD_OUT_OF_RANGE: StatusCode = StatusCode(0x803c_0000);
    pub const BAD_TYPE_MISMATCH: StatusCode = StatusCode(0x8074_0000);
    pub const BAD_INTERNAL_ERROR: StatusCode = StatusCode(0x8002_0000);

    pub fn from_bits(bits: u32) -> StatusCode {
        StatusCode(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_good(&self) -> bool {
        !self.is_bad() && !self.is_uncertain()
    }

    pub fn is_bad(&self) -> bool {
        self.0 & SEVERITY_BAD != 0
    }

    pub fn is_uncertain(&self) -> bool {
        self.0 & SEVERITY_UNCERTAIN != 0
    }

    /// The symbolic name if this is one of the codes the crate knows about.
    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            StatusCode::GOOD => "Good",
            StatusCode::BAD_UNEXPECTED_ERROR => "BadUnexpectedError",
            StatusCode::BAD_ENCODING_ERROR => "BadEncodingError",
            StatusCode::BAD_DECODING_ERROR => "BadDecodingError",
            StatusCode::BAD_ENCODING_LIMITS_EXCEEDED => "BadEncodingLimitsExceeded",
            StatusCode::BAD_DATA_TYPE_ID_UNKNOWN => "BadDataTypeIdUnknown",
            StatusCode::BAD_DATA_ENCODING_UNSUPPORTED => "BadDataEncodingUnsupported",
            StatusCode::BAD_OUT_OF_RANGE => "BadOutOfRange",
            StatusCode::BAD_TYPE_MISMATCH => "BadTypeMismatch",
            StatusCode::BAD_INTERNAL_ERROR => "BadInternalError",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:08x}", self.0),
        }
    }
}

impl BinaryCodable for StatusCode {
    fn byte_len(&self) -> usize {
        4
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_u32(stream, self.0)
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        Ok(StatusCode(read_u32(stream)?))
    }
}

impl Serialize for StatusCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

struct StatusCodeVisitor;

impl<'de> Visitor<'de> for StatusCodeVisitor {
    type Value = u32;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an unsigned 32-bit integer")
    }

    fn visit_u32<E>(self, value: u32) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        u32::try_from(value).map_err(|_| E::custom("status code out of range"))
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(StatusCode(deserializer.deserialize_u32(StatusCodeVisitor)?))
    }
}

#[test]
fn status_code_severity() {
    assert!(StatusCode::GOOD.is_good());
    assert!(!StatusCode::GOOD.is_bad());
    assert!(StatusCode::BAD_DECODING_ERROR.is_bad());
    assert!(!StatusCode::BAD_DECODING_ERROR.is_good());
    assert!(StatusCode::from_bits(0x4000_0000).is_uncertain());
}

#[test]
fn status_code_display() {
    assert_eq!(StatusCode::GOOD.to_string(), "Good");
    assert_eq!(StatusCode::from_bits(0x80de_0000).to_string(), "0x80de0000");
}
