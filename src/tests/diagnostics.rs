// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

use std::io::Cursor;

use crate::tests::*;

fn record(symbolic_id: &str, message: &str) -> DiagnosticRecord {
    DiagnosticRecord {
        symbolic_id: Some(symbolic_id.to_string()),
        message: Some(message.to_string()),
        ..Default::default()
    }
}

#[test]
fn empty_chain_encodes_to_nothing() {
    let mut table = StringTable::new();
    assert_eq!(encode_chain(&[], &mut table), None);
    assert!(table.is_empty());
}

#[test]
fn three_level_chain_round_trips() {
    let records = vec![
        DiagnosticRecord {
            symbolic_id: Some("BadOuter".to_string()),
            message: Some("request failed".to_string()),
            inner_status_code: Some(StatusCode::BAD_INTERNAL_ERROR),
            ..Default::default()
        },
        record("BadMiddle", "handler failed"),
        DiagnosticRecord {
            symbolic_id: Some("BadInner".to_string()),
            message: Some("device unreachable".to_string()),
            additional_info: Some("port 4840".to_string()),
            ..Default::default()
        },
    ];

    let mut table = StringTable::new();
    let info = encode_chain(&records, &mut table).unwrap();

    // The outermost record heads the wire chain.
    assert_eq!(table.resolve(info.symbolic_id.unwrap()), Some("BadOuter"));
    let inner = info.inner_diagnostic_info.as_ref().unwrap();
    assert_eq!(table.resolve(inner.symbolic_id.unwrap()), Some("BadMiddle"));

    // Wire round trip of the nested form.
    let buf = info.encode_to_vec().unwrap();
    let decoded = DiagnosticInfo::decode(&mut Cursor::new(buf), &DecodingOptions::test()).unwrap();
    assert_eq!(decoded, info);

    assert_eq!(decode_chain(&decoded, &table), records);
}

#[test]
fn repeated_strings_intern_once() {
    let records = vec![
        record("BadTimeout", "timed out"),
        record("BadTimeout", "timed out"),
        record("BadTimeout", "retry exhausted"),
    ];
    let mut table = StringTable::new();
    let info = encode_chain(&records, &mut table).unwrap();
    // "BadTimeout", "timed out", "retry exhausted".
    assert_eq!(table.len(), 3);

    // Both outer records point at the same indices.
    let second = info.inner_diagnostic_info.as_ref().unwrap();
    assert_eq!(info.symbolic_id, second.symbolic_id);
    assert_eq!(info.localized_text, second.localized_text);
}

#[test]
fn string_table_round_trips_on_the_wire() {
    let mut table = StringTable::new();
    table.intern("alpha");
    table.intern("beta");
    table.intern("alpha");
    assert_eq!(table.len(), 2);

    let mut decoded = serialize_test_and_return(table);
    // Interning still dedupes after a round trip.
    assert_eq!(decoded.intern("beta"), 1);
}

#[test]
fn damaged_indices_resolve_to_none_without_failing() {
    let info = DiagnosticInfo {
        symbolic_id: Some(40),
        localized_text: Some(-1),
        ..Default::default()
    };
    let table = StringTable::new();
    let records = decode_chain(&info, &table);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].symbolic_id, None);
    assert_eq!(records[0].message, None);
}
