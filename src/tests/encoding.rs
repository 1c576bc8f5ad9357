// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

use std::io::Cursor;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::tests::*;

#[test]
fn encode_bool() {
    serialize_and_compare(true, &[1]);
    serialize_and_compare(false, &[0]);
}

#[test]
fn encode_int32_little_endian() {
    serialize_and_compare(1_000_000_000i32, &[0x00, 0xca, 0x9a, 0x3b]);
    serialize_and_compare(-1i32, &[0xff, 0xff, 0xff, 0xff]);
}

#[test]
fn encode_double() {
    serialize_and_compare(2.0f64, &[0, 0, 0, 0, 0, 0, 0, 0x40]);
    serialize_test(f64::MIN_POSITIVE);
}

#[test]
fn scalar_round_trips() {
    serialize_test(0xffu8);
    serialize_test(-100i8);
    serialize_test(0xabcdu16);
    serialize_test(-20000i16);
    serialize_test(0xdead_beefu32);
    serialize_test(i64::MIN);
    serialize_test(u64::MAX);
    serialize_test(1.5f32);
}

#[test]
fn string_null_and_empty_are_distinct_on_the_wire() {
    serialize_and_compare(UAString::null(), &[0xff, 0xff, 0xff, 0xff]);
    serialize_and_compare(UAString::from(""), &[0x00, 0x00, 0x00, 0x00]);
    let decoded = serialize_test_and_return(UAString::from("hello"));
    assert_eq!(decoded.value(), Some("hello"));
}

#[test]
fn string_utf8_round_trip() {
    serialize_test(UAString::from("Ô¿½Ô"));
}

#[test]
fn string_length_below_minus_one_is_malformed() {
    let mut stream = Cursor::new(vec![0xfe, 0xff, 0xff, 0xff]);
    let result = UAString::decode(&mut stream, &DecodingOptions::test());
    assert!(matches!(result, Err(CodecError::MalformedLength(-2))));
}

#[test]
fn string_limit_is_enforced() {
    let options = DecodingOptions {
        max_string_length: 4,
        ..DecodingOptions::test()
    };
    let buf = UAString::from("too long").encode_to_vec().unwrap();
    let result = UAString::decode(&mut Cursor::new(buf), &options);
    assert!(matches!(
        result,
        Err(CodecError::LimitExceeded { kind: "String", .. })
    ));
}

#[test]
fn truncated_stream_is_its_own_error() {
    // Claims 10 bytes but carries 2.
    let mut stream = Cursor::new(vec![0x0a, 0x00, 0x00, 0x00, b'h', b'i']);
    let result = UAString::decode(&mut stream, &DecodingOptions::test());
    assert!(matches!(result, Err(CodecError::TruncatedStream)));
}

#[test]
fn byte_string_round_trip() {
    serialize_and_compare(ByteString::null(), &[0xff, 0xff, 0xff, 0xff]);
    serialize_test(ByteString::from(vec![1u8, 2, 3, 4, 5]));
}

#[test]
fn guid_round_trip() {
    serialize_test(Guid::null());
    serialize_test(Guid::new());
}

#[test]
fn date_time_round_trip() {
    serialize_test(DateTime::epoch());
    serialize_test(DateTime::ymd_hms(2024, 7, 14, 12, 30, 5));
    serialize_test(DateTime::endtimes());
}

#[test]
fn qualified_name_round_trip() {
    serialize_test(QualifiedName::null());
    serialize_test(QualifiedName::new(2, "Browse"));
}

#[test]
fn localized_text_round_trip() {
    serialize_test(LocalizedText::null());
    serialize_test(LocalizedText::new("en", "Hello"));
    // Text without locale exercises the partial mask.
    serialize_test(LocalizedText {
        locale: UAString::null(),
        text: UAString::from("Hello"),
    });
}

#[test]
fn status_code_round_trip() {
    serialize_test(StatusCode::GOOD);
    serialize_test(StatusCode::BAD_DECODING_ERROR);
}

#[test]
fn depth_gauge_unwinds_on_drop() {
    let gauge = Arc::new(Mutex::new(DepthGauge::new(2)));
    let a = DepthLock::obtain(gauge.clone()).unwrap();
    {
        let _b = DepthLock::obtain(gauge.clone()).unwrap();
        assert!(DepthLock::obtain(gauge.clone()).is_err());
    }
    // The inner lock dropped, so one more level is available again.
    let _c = DepthLock::obtain(gauge.clone()).unwrap();
    drop(a);
}

#[test]
fn nested_diagnostic_info_stops_at_depth_limit() {
    let mut info = DiagnosticInfo::default();
    for _ in 0..64 {
        info = DiagnosticInfo {
            inner_diagnostic_info: Some(Box::new(info)),
            ..Default::default()
        };
    }
    let buf = info.encode_to_vec().unwrap();
    let result = DiagnosticInfo::decode(&mut Cursor::new(buf), &DecodingOptions::test());
    assert!(matches!(result, Err(CodecError::DepthExceeded)));
}

#[test]
fn error_paths_accumulate_outermost_first() {
    let err = CodecError::TruncatedStream.at("NodeId").at("ReadValueId");
    assert_eq!(err.path(), Some("ReadValueId.NodeId"));
    assert_eq!(err.status(), StatusCode::BAD_DECODING_ERROR);
}
