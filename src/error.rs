// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! The codec error taxonomy. Schema problems are fatal at registry build
//! time, decoding and encoding problems fail a single call, and unknown
//! extension object types are deliberately *not* errors during generic
//! decoding; they only surface when a caller demands a resolved value.

use thiserror::Error;

use crate::{node_id::NodeId, status_code::StatusCode};

pub type EncodingResult<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    // Schema errors. These abort registry construction.
    #[error("type {0} is already registered with a different descriptor")]
    DuplicateType(NodeId),
    #[error("encoding id {0} is claimed by more than one type")]
    DuplicateEncodingId(NodeId),
    #[error("enumeration {0} is already registered with different members")]
    DuplicateEnum(String),
    #[error("base type {base} of {derived} is not registered")]
    MissingBaseType { derived: NodeId, base: NodeId },
    #[error("base-type chain of {0} does not terminate")]
    CyclicBaseType(NodeId),
    #[error("type {type_id} has {count} optional fields, more than a 32-bit presence mask allows")]
    TooManyOptionalFields { type_id: NodeId, count: usize },
    #[error("the global type registry has already been installed")]
    RegistryAlreadyInstalled,

    // Lookup failures, raised only when the caller needs a resolved value.
    #[error("no descriptor is registered for type {0}")]
    UnknownType(NodeId),
    #[error("no bitmask enumeration named {0} is registered")]
    UnknownEnum(String),
    #[error("enumeration {enumeration} has no member named {member}")]
    UnknownEnumMember {
        enumeration: String,
        member: String,
    },
    #[error("type {0} has no field named {1}")]
    UnknownField(NodeId, String),
    #[error("type {0} is abstract and cannot be instantiated")]
    AbstractType(NodeId),

    // Decoding errors.
    #[error("length prefix {0} is not a valid wire length")]
    MalformedLength(i64),
    #[error("{kind} length {len} exceeds the limit of {max}")]
    LimitExceeded {
        kind: &'static str,
        len: usize,
        max: usize,
    },
    #[error("stream ended before the value was complete")]
    TruncatedStream,
    #[error("{0} bytes left over after the value was decoded")]
    TrailingBytes(usize),
    #[error("unrecognized identifier tag 0x{0:02x}")]
    InvalidIdentifierEncoding(u8),
    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
    #[error("recursion depth limit reached while decoding")]
    DepthExceeded,
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    // Encoding errors.
    #[error("array of {len} elements exceeds the encoder limit of {max}")]
    ArrayTooLarge { len: usize, max: usize },
    #[error("field holds {actual} where the schema expects {expected}")]
    FieldTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("field kind {0} cannot be represented on the wire")]
    UnsupportedField(&'static str),
    #[error("value out of range: {0}")]
    OutOfRange(String),

    // I/O errors from the underlying stream propagate unchanged.
    #[error("i/o error: {0}")]
    Io(#[source] std::io::Error),

    // A lower error wrapped with the field path that produced it.
    #[error("{path}: {source}")]
    Context {
        path: String,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Wraps the error with a path segment, e.g. a structure name, a field
    /// name or `field[index]`. Segments accumulate outermost-first so a
    /// failure deep inside a message reads `Request.items[3].node_id: ...`.
    pub fn at(self, segment: &str) -> CodecError {
        match self {
            CodecError::Context { path, source } => CodecError::Context {
                path: format!("{}.{}", segment, path),
                source,
            },
            other => CodecError::Context {
                path: segment.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The field path accumulated through [`CodecError::at`], if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            CodecError::Context { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Maps the error onto the status code reported per item in batched
    /// responses.
    pub fn status(&self) -> StatusCode {
        match self {
            CodecError::UnknownType(_) | CodecError::UnknownEnum(_) => {
                StatusCode::BAD_DATA_TYPE_ID_UNKNOWN
            }
            CodecError::MalformedLength(_)
            | CodecError::LimitExceeded { .. }
            | CodecError::TruncatedStream
            | CodecError::TrailingBytes(_)
            | CodecError::InvalidIdentifierEncoding(_)
            | CodecError::InvalidUtf8
            | CodecError::DepthExceeded
            | CodecError::MalformedXml(_) => StatusCode::BAD_DECODING_ERROR,
            CodecError::ArrayTooLarge { .. } => StatusCode::BAD_ENCODING_LIMITS_EXCEEDED,
            CodecError::FieldTypeMismatch { .. } => StatusCode::BAD_TYPE_MISMATCH,
            CodecError::UnsupportedField(_) => StatusCode::BAD_DATA_ENCODING_UNSUPPORTED,
            CodecError::OutOfRange(_) => StatusCode::BAD_OUT_OF_RANGE,
            CodecError::Io(_) => StatusCode::BAD_UNEXPECTED_ERROR,
            CodecError::Context { source, .. } => source.status(),
            _ => StatusCode::BAD_INTERNAL_ERROR,
        }
    }
}
