// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

use std::io::Cursor;

use crate::tests::*;

fn round_trip(registry: &TypeRegistry, structure: &Structure) -> Structure {
    let encoder = BinaryEncoder::new();
    let mut stream = Cursor::new(Vec::new());
    let written = encoder.encode_structure(structure, &mut stream).unwrap();
    assert_eq!(written, encoder.byte_len_structure(structure).unwrap());
    let decoder = BinaryDecoder::new(registry, DecodingOptions::test());
    let decoded = decoder
        .decode_structure(structure.type_id(), &mut Cursor::new(stream.into_inner()))
        .unwrap();
    assert_eq!(&decoded, structure);
    decoded
}

#[test]
fn read_value_id_wire_bytes() {
    let registry = test_registry();
    let value = sample_read_value_id(&registry);
    let encoder = BinaryEncoder::new();
    let mut stream = Cursor::new(Vec::new());
    encoder.encode_structure(&value, &mut stream).unwrap();
    assert_eq!(
        stream.into_inner(),
        vec![
            // NodeId ns=2;i=100 in the four byte form.
            0x01, 0x02, 0x64, 0x00,
            // AttributeId 13.
            0x0d, 0x00, 0x00, 0x00,
            // IndexRange, null string.
            0xff, 0xff, 0xff, 0xff,
            // DataEncoding, null qualified name.
            0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
        ]
    );
}

#[test]
fn structure_round_trip() {
    let registry = test_registry();
    let mut value = sample_read_value_id(&registry);
    value
        .set("IndexRange", "1:2")
        .unwrap()
        .set("DataEncoding", QualifiedName::new(0, "Default Binary"))
        .unwrap();
    round_trip(&registry, &value);
}

#[test]
fn nested_structure_array_round_trip() {
    let registry = test_registry();
    let mut request = registry.new_structure(&read_request_type()).unwrap();
    let mut second = sample_read_value_id(&registry);
    second.set("AttributeId", 1u32).unwrap();
    request
        .set("MaxAge", 500.0)
        .unwrap()
        .set(
            "NodesToRead",
            WireValue::Array(Some(vec![
                sample_read_value_id(&registry).into(),
                second.into(),
            ])),
        )
        .unwrap();
    let decoded = round_trip(&registry, &request);
    match decoded.get("NodesToRead") {
        Some(WireValue::Array(Some(elements))) => assert_eq!(elements.len(), 2),
        other => panic!("unexpected value {:?}", other),
    }
}

#[test]
fn null_and_empty_arrays_are_distinct() {
    let registry = test_registry();
    let mut request = registry.new_structure(&read_request_type()).unwrap();
    // Defaults to the null array.
    let decoded = round_trip(&registry, &request);
    assert_eq!(decoded.get("NodesToRead"), Some(&WireValue::Array(None)));

    request
        .set("NodesToRead", WireValue::Array(Some(vec![])))
        .unwrap();
    let decoded = round_trip(&registry, &request);
    assert_eq!(
        decoded.get("NodesToRead"),
        Some(&WireValue::Array(Some(vec![])))
    );
}

#[test]
fn inherited_fields_encode_base_first() {
    let registry = test_registry();
    let mut event = registry.new_structure(&audit_event_type()).unwrap();
    event
        .set("EventId", ByteString::from(vec![9u8]))
        .unwrap()
        .set("Time", DateTime::ymd_hms(2024, 1, 1, 0, 0, 0))
        .unwrap()
        .set("ActionName", "write")
        .unwrap();
    let encoder = BinaryEncoder::new();
    let buf = {
        let mut stream = Cursor::new(Vec::new());
        encoder.encode_structure(&event, &mut stream).unwrap();
        stream.into_inner()
    };
    // EventId, the base field, leads: length 1 then the payload byte.
    assert_eq!(&buf[..5], &[0x01, 0x00, 0x00, 0x00, 0x09]);
    round_trip(&registry, &event);
}

#[test]
fn optional_fields_round_trip_through_the_mask() {
    let registry = test_registry();
    let mut details = registry.new_structure(&history_read_type()).unwrap();
    details.set("NumValues", 50u32).unwrap();
    // Bounds stays absent.
    let encoder = BinaryEncoder::new();
    let buf = {
        let mut stream = Cursor::new(Vec::new());
        encoder.encode_structure(&details, &mut stream).unwrap();
        stream.into_inner()
    };
    // Mask has bit 0 (NumValues) set, bit 1 (Bounds) clear.
    assert_eq!(&buf[..4], &[0x01, 0x00, 0x00, 0x00]);
    // Mask + StartTime + NumValues, no bytes for Bounds.
    assert_eq!(buf.len(), 4 + 8 + 4);

    let decoder = BinaryDecoder::new(&registry, DecodingOptions::test());
    let decoded = decoder
        .decode_structure(&history_read_type(), &mut Cursor::new(buf))
        .unwrap();
    assert_eq!(decoded.get("NumValues"), Some(&WireValue::UInt32(50)));
    assert_eq!(decoded.get("Bounds"), Some(&WireValue::Null));
}

#[test]
fn enum_mask_field_round_trip() {
    let registry = test_registry();
    let access = registry.lookup_enum("AccessLevel").unwrap().clone();
    let mut value = registry.new_structure(&access_description_type()).unwrap();
    value
        .set("BrowseName", QualifiedName::new(1, "Temperature"))
        .unwrap()
        .set(
            "UserAccessLevel",
            EnumSet::from_names(access, ["CurrentRead", "HistoryRead"]).unwrap(),
        )
        .unwrap();
    let decoded = round_trip(&registry, &value);
    match decoded.get("UserAccessLevel") {
        Some(WireValue::EnumSet(set)) => {
            assert_eq!(set.mask(), 5);
            assert!(set.contains("CurrentRead"));
            assert!(!set.contains("CurrentWrite"));
        }
        other => panic!("unexpected value {:?}", other),
    }
}

#[test]
fn decode_failure_names_the_field_path() {
    let registry = test_registry();
    let decoder = BinaryDecoder::new(&registry, DecodingOptions::test());
    // A valid NodeId then a truncated AttributeId.
    let err = decoder
        .decode_structure(
            &read_value_id_type(),
            &mut Cursor::new(vec![0x00, 0x05, 0x0d]),
        )
        .unwrap_err();
    assert_eq!(err.path(), Some("ReadValueId.AttributeId"));
    assert_eq!(err.status(), StatusCode::BAD_DECODING_ERROR);
}

#[test]
fn encoder_rejects_oversized_arrays() {
    let registry = test_registry();
    let mut request = registry.new_structure(&read_request_type()).unwrap();
    let items: Vec<WireValue> = (0..4)
        .map(|_| sample_read_value_id(&registry).into())
        .collect();
    request
        .set("NodesToRead", WireValue::Array(Some(items)))
        .unwrap();
    let encoder = BinaryEncoder::new().with_max_array_length(3);
    let err = encoder
        .encode_structure(&request, &mut Cursor::new(Vec::new()))
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_ENCODING_LIMITS_EXCEEDED);
    assert_eq!(err.path(), Some("ReadRequest.NodesToRead"));
}

#[test]
fn decoder_rejects_oversized_arrays() {
    let registry = test_registry();
    let mut request = registry.new_structure(&read_request_type()).unwrap();
    let items: Vec<WireValue> = (0..4)
        .map(|_| sample_read_value_id(&registry).into())
        .collect();
    request
        .set("NodesToRead", WireValue::Array(Some(items)))
        .unwrap();
    let encoder = BinaryEncoder::new();
    let buf = {
        let mut stream = Cursor::new(Vec::new());
        encoder.encode_structure(&request, &mut stream).unwrap();
        stream.into_inner()
    };
    let options = DecodingOptions {
        max_array_length: 3,
        ..DecodingOptions::test()
    };
    let err = BinaryDecoder::new(&registry, options)
        .decode_structure(&read_request_type(), &mut Cursor::new(buf))
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::Context { .. }
    ));
    assert_eq!(err.status(), StatusCode::BAD_DECODING_ERROR);
}

#[test]
fn extension_object_wraps_and_resolves() {
    let registry = test_registry();
    let value = sample_read_value_id(&registry);
    let encoder = BinaryEncoder::new();
    let object = encoder.extension_object(&value).unwrap();
    assert_eq!(object.type_id, read_value_id_binary());

    let decoder = BinaryDecoder::new(&registry, DecodingOptions::test());
    match decoder.resolve_extension_object(&object).unwrap() {
        WireValue::Structure(decoded) => assert_eq!(decoded, value),
        other => panic!("unexpected value {:?}", other),
    }
}

#[test]
fn trailing_body_bytes_fail_resolution() {
    let registry = test_registry();
    let value = sample_read_value_id(&registry);
    let object = BinaryEncoder::new().extension_object(&value).unwrap();
    let mut body = match &object.body {
        ExtensionObjectBody::Binary(bytes) => bytes.value().unwrap().to_vec(),
        other => panic!("unexpected body {:?}", other),
    };
    body.extend_from_slice(&[0xaa, 0xbb, 0xcc]);
    let padded = ExtensionObject {
        type_id: object.type_id,
        body: ExtensionObjectBody::Binary(ByteString::from(body)),
    };
    let decoder = BinaryDecoder::new(&registry, DecodingOptions::test());
    let err = decoder.resolve_extension_object(&padded).unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_DECODING_ERROR);
    assert_eq!(err.path(), Some("ReadValueId"));
}

#[test]
fn unknown_extension_object_round_trips_byte_for_byte() {
    let registry = test_registry();
    let opaque = ExtensionObject {
        type_id: NodeId::new(7, 777u32),
        body: ExtensionObjectBody::Binary(ByteString::from(vec![0xde, 0xad, 0xbe, 0xef])),
    };
    let wire = opaque.encode_to_vec().unwrap();
    let decoder = BinaryDecoder::new(&registry, DecodingOptions::test());
    let resolved = decoder.resolve_extension_object(&opaque).unwrap();
    match resolved {
        WireValue::ExtensionObject(relayed) => {
            assert_eq!(relayed.encode_to_vec().unwrap(), wire);
        }
        other => panic!("unexpected value {:?}", other),
    }
}

#[test]
fn batch_decoding_degrades_per_item() {
    let registry = test_registry();
    let encoder = BinaryEncoder::new();
    let good = encoder
        .extension_object(&sample_read_value_id(&registry))
        .unwrap();
    // A known type id over a truncated body.
    let damaged = ExtensionObject {
        type_id: read_value_id_binary(),
        body: ExtensionObjectBody::Binary(ByteString::from(vec![0x01])),
    };
    let unknown = ExtensionObject {
        type_id: NodeId::new(7, 777u32),
        body: ExtensionObjectBody::Binary(ByteString::from(vec![1u8, 2, 3])),
    };

    let decoder = BinaryDecoder::new(&registry, DecodingOptions::test());
    let batch = decoder.decode_batch(&[good, damaged, unknown]);
    assert_eq!(batch.len(), 3);

    assert!(batch[0].is_good());
    assert!(matches!(batch[0].value, WireValue::Structure(_)));

    assert_eq!(batch[1].status, StatusCode::BAD_DECODING_ERROR);
    assert_eq!(batch[1].value, WireValue::Null);

    // Unknown types are not an error, the raw object passes through.
    assert!(batch[2].is_good());
    assert!(matches!(batch[2].value, WireValue::ExtensionObject(_)));
}
