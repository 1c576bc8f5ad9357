// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! A schema-driven codec for the OPC UA wire forms.
//!
//! Structure types are described by [`TypeDescriptor`]s collected into an
//! immutable [`TypeRegistry`]; the registry flattens base-type chains once
//! at build time so encoding and decoding walk a plain field list. The
//! [`BinaryEncoder`]/[`BinaryDecoder`] pair covers the Part 6 binary form,
//! [`XmlEncoder`]/[`XmlDecoder`] the XML form, both over the same dynamic
//! [`WireValue`] model.
//!
//! Extension objects carry their payloads opaque; a known type resolves to
//! a [`Structure`] on demand, an unknown one round-trips byte-for-byte.
//! Batch decoding degrades per item rather than failing whole responses,
//! and diagnostic cause chains encode against a shared message
//! [`StringTable`].

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate serde_derive;

pub mod basic_types;
pub mod bitmask;
pub mod byte_string;
pub mod clone_eq;
pub mod codec;
pub mod constants;
pub mod date_time;
pub mod descriptor;
pub mod diagnostic_info;
pub mod encoding;
pub mod error;
pub mod extension_object;
pub mod guid;
pub mod node_id;
pub mod registry;
pub mod status_code;
pub mod string;
pub mod value;
pub mod xml;

pub use crate::{
    basic_types::{LocalizedText, QualifiedName},
    bitmask::{EnumDescriptor, EnumMember, EnumSet},
    byte_string::ByteString,
    clone_eq::{deep_clone, deep_clone_structure, structural_eq, structural_hash},
    codec::{BatchItem, BinaryDecoder, BinaryEncoder},
    date_time::{DateTime, DateTimeUtc},
    descriptor::{FieldDescriptor, FieldKind, TypeDescriptor},
    diagnostic_info::{
        decode_chain, encode_chain, DiagnosticInfo, DiagnosticRecord, StringTable,
    },
    encoding::{BinaryCodable, DecodingOptions, DepthGauge, DepthLock},
    error::{CodecError, EncodingResult},
    extension_object::{ExtensionObject, ExtensionObjectBody},
    guid::Guid,
    node_id::{ExpandedNodeId, Identifier, NodeId},
    registry::{TypeRegistry, TypeRegistryBuilder},
    status_code::StatusCode,
    string::{UAString, XmlElement},
    value::{Structure, WireValue},
    xml::{XmlDecoder, XmlEncoder},
};

#[cfg(test)]
mod tests;
