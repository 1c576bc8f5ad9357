// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Contains `DiagnosticInfo`, the per-message shared `StringTable`, and the
//! chain codec that converts between nested wire records and a flat list of
//! application-facing diagnostic records.
//!
//! String-valued diagnostic fields travel as Int32 indices into one string
//! table shared by the whole containing message, so a long cause chain that
//! repeats the same message interns it exactly once.

use std::io::{Read, Write};

use std::collections::HashMap;

use crate::{
    encoding::{
        read_array, read_i32, read_u8, write_i32, write_u8, BinaryCodable, DecodingOptions,
        EncodingResult,
    },
    status_code::StatusCode,
    string::UAString,
};

bitflags! {
    struct DiagnosticInfoMask: u8 {
        const HAS_SYMBOLIC_ID = 0x01;
        const HAS_NAMESPACE = 0x02;
        const HAS_LOCALIZED_TEXT = 0x04;
        const HAS_LOCALE = 0x08;
        const HAS_ADDITIONAL_INFO = 0x10;
        const HAS_INNER_STATUS_CODE = 0x20;
        const HAS_INNER_DIAGNOSTIC_INFO = 0x40;
    }
}

/// The wire form of one diagnostic record. The `Option` fields drive the
/// leading presence mask; index fields refer into the message string table.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, Serialize, Deserialize)]
pub struct DiagnosticInfo {
    /// Index of a symbolic name for the status code.
    pub symbolic_id: Option<i32>,
    /// Index of the namespace uri qualifying the symbolic id.
    pub namespace_uri: Option<i32>,
    /// Index of the locale used for the localized text.
    pub locale: Option<i32>,
    /// Index of a human readable summary.
    pub localized_text: Option<i32>,
    /// Detailed application specific diagnostic information, inline.
    pub additional_info: Option<UAString>,
    /// A status code provided by an underlying system.
    pub inner_status_code: Option<StatusCode>,
    /// The next record of the cause chain.
    pub inner_diagnostic_info: Option<Box<DiagnosticInfo>>,
}

impl BinaryCodable for DiagnosticInfo {
    fn byte_len(&self) -> usize {
        let mut size = 1;
        size += self.symbolic_id.map_or(0, |_| 4);
        size += self.namespace_uri.map_or(0, |_| 4);
        size += self.locale.map_or(0, |_| 4);
        size += self.localized_text.map_or(0, |_| 4);
        if let Some(ref additional_info) = self.additional_info {
            size += additional_info.byte_len();
        }
        size += self.inner_status_code.map_or(0, |_| 4);
        if let Some(ref inner) = self.inner_diagnostic_info {
            size += inner.byte_len();
        }
        size
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut size = write_u8(stream, self.encoding_mask().bits())?;
        if let Some(symbolic_id) = self.symbolic_id {
            size += write_i32(stream, symbolic_id)?;
        }
        if let Some(namespace_uri) = self.namespace_uri {
            size += write_i32(stream, namespace_uri)?;
        }
        if let Some(locale) = self.locale {
            size += write_i32(stream, locale)?;
        }
        if let Some(localized_text) = self.localized_text {
            size += write_i32(stream, localized_text)?;
        }
        if let Some(ref additional_info) = self.additional_info {
            size += additional_info.encode(stream)?;
        }
        if let Some(inner_status_code) = self.inner_status_code {
            size += inner_status_code.encode(stream)?;
        }
        if let Some(ref inner) = self.inner_diagnostic_info {
            size += inner.encode(stream)?;
        }
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self> {
        // The inner record recurses, so the chain counts against the
        // decoding depth limit.
        let _depth_lock = options.depth_lock()?;
        let mask = DiagnosticInfoMask::from_bits_truncate(read_u8(stream)?);
        let mut info = DiagnosticInfo::default();
        if mask.contains(DiagnosticInfoMask::HAS_SYMBOLIC_ID) {
            info.symbolic_id = Some(read_i32(stream)?);
        }
        if mask.contains(DiagnosticInfoMask::HAS_NAMESPACE) {
            info.namespace_uri = Some(read_i32(stream)?);
        }
        if mask.contains(DiagnosticInfoMask::HAS_LOCALE) {
            info.locale = Some(read_i32(stream)?);
        }
        if mask.contains(DiagnosticInfoMask::HAS_LOCALIZED_TEXT) {
            info.localized_text = Some(read_i32(stream)?);
        }
        if mask.contains(DiagnosticInfoMask::HAS_ADDITIONAL_INFO) {
            info.additional_info = Some(UAString::decode(stream, options)?);
        }
        if mask.contains(DiagnosticInfoMask::HAS_INNER_STATUS_CODE) {
            info.inner_status_code = Some(StatusCode::decode(stream, options)?);
        }
        if mask.contains(DiagnosticInfoMask::HAS_INNER_DIAGNOSTIC_INFO) {
            info.inner_diagnostic_info = Some(Box::new(DiagnosticInfo::decode(stream, options)?));
        }
        Ok(info)
    }
}

impl DiagnosticInfo {
    pub fn null() -> DiagnosticInfo {
        DiagnosticInfo::default()
    }

    pub fn is_null(&self) -> bool {
        *self == DiagnosticInfo::default()
    }

    fn encoding_mask(&self) -> DiagnosticInfoMask {
        let mut mask = DiagnosticInfoMask::empty();
        if self.symbolic_id.is_some() {
            mask |= DiagnosticInfoMask::HAS_SYMBOLIC_ID;
        }
        if self.namespace_uri.is_some() {
            mask |= DiagnosticInfoMask::HAS_NAMESPACE;
        }
        if self.locale.is_some() {
            mask |= DiagnosticInfoMask::HAS_LOCALE;
        }
        if self.localized_text.is_some() {
            mask |= DiagnosticInfoMask::HAS_LOCALIZED_TEXT;
        }
        if self.additional_info.is_some() {
            mask |= DiagnosticInfoMask::HAS_ADDITIONAL_INFO;
        }
        if self.inner_status_code.is_some() {
            mask |= DiagnosticInfoMask::HAS_INNER_STATUS_CODE;
        }
        if self.inner_diagnostic_info.is_some() {
            mask |= DiagnosticInfoMask::HAS_INNER_DIAGNOSTIC_INFO;
        }
        mask
    }
}

/// The string table shared by every diagnostic record of one message.
/// Interning the same string twice returns the same index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringTable {
    strings: Vec<UAString>,
    index: HashMap<String, i32>,
}

impl BinaryCodable for StringTable {
    fn byte_len(&self) -> usize {
        4 + self.strings.iter().map(|s| s.byte_len()).sum::<usize>()
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        // An empty table still encodes as an empty (not null) array so the
        // peer can distinguish "no diagnostics requested" at a layer above.
        let mut size = write_i32(stream, self.strings.len() as i32)?;
        for s in &self.strings {
            size += s.encode(stream)?;
        }
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, options: &DecodingOptions) -> EncodingResult<Self> {
        let strings = read_array::<_, UAString>(stream, options)?.unwrap_or_default();
        let mut table = StringTable::default();
        for s in strings {
            table.push(s);
        }
        Ok(table)
    }
}

impl StringTable {
    pub fn new() -> StringTable {
        StringTable::default()
    }

    /// Adds the string if it is not present and returns its index.
    pub fn intern(&mut self, value: &str) -> i32 {
        if let Some(index) = self.index.get(value) {
            return *index;
        }
        let index = self.strings.len() as i32;
        self.strings.push(UAString::from(value));
        self.index.insert(value.to_string(), index);
        index
    }

    fn push(&mut self, value: UAString) {
        let index = self.strings.len() as i32;
        if let Some(s) = value.value() {
            self.index.entry(s.to_string()).or_insert(index);
        }
        self.strings.push(value);
    }

    /// Looks an index up. Out-of-range and negative indices resolve to
    /// `None`; peers send -1 for "no entry".
    pub fn resolve(&self, index: i32) -> Option<&str> {
        if index < 0 {
            return None;
        }
        self.strings.get(index as usize).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn strings(&self) -> &[UAString] {
        &self.strings
    }
}

/// One level of a cause chain as the application sees it, with the string
/// table already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagnosticRecord {
    pub symbolic_id: Option<String>,
    pub namespace_uri: Option<String>,
    pub locale: Option<String>,
    pub message: Option<String>,
    pub additional_info: Option<String>,
    pub inner_status_code: Option<StatusCode>,
}

/// Encodes a cause chain, outermost record first, interning every string
/// field into `table`. Returns `None` for an empty chain.
pub fn encode_chain(
    records: &[DiagnosticRecord],
    table: &mut StringTable,
) -> Option<DiagnosticInfo> {
    let mut result: Option<DiagnosticInfo> = None;
    // Built innermost-first so each record can box the chain behind it.
    for record in records.iter().rev() {
        let info = DiagnosticInfo {
            symbolic_id: record.symbolic_id.as_deref().map(|s| table.intern(s)),
            namespace_uri: record.namespace_uri.as_deref().map(|s| table.intern(s)),
            locale: record.locale.as_deref().map(|s| table.intern(s)),
            localized_text: record.message.as_deref().map(|s| table.intern(s)),
            additional_info: record.additional_info.as_deref().map(UAString::from),
            inner_status_code: record.inner_status_code,
            inner_diagnostic_info: result.take().map(Box::new),
        };
        result = Some(info);
    }
    result
}

/// Walks a decoded chain outermost-first, resolving indices against the
/// message string table. Indices with no table entry come back as `None`;
/// a damaged table must not fail the whole chain.
pub fn decode_chain(info: &DiagnosticInfo, table: &StringTable) -> Vec<DiagnosticRecord> {
    let mut records = Vec::new();
    let mut current = Some(info);
    while let Some(info) = current {
        let resolve = |index: Option<i32>| -> Option<String> {
            let index = index?;
            let resolved = table.resolve(index);
            if resolved.is_none() {
                warn!("Diagnostic string index {} is not in the table", index);
            }
            resolved.map(|s| s.to_string())
        };
        records.push(DiagnosticRecord {
            symbolic_id: resolve(info.symbolic_id),
            namespace_uri: resolve(info.namespace_uri),
            locale: resolve(info.locale),
            message: resolve(info.localized_text),
            additional_info: info.additional_info.as_ref().and_then(|s| {
                s.value().map(|v| v.to_string())
            }),
            inner_status_code: info.inner_status_code,
        });
        current = info.inner_diagnostic_info.as_deref();
    }
    records
}
