// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

use crate::tests::*;

#[test]
fn cloned_structures_are_independent() {
    let registry = test_registry();
    let original = sample_read_value_id(&registry);
    let mut copy = deep_clone_structure(&original);
    assert!(structural_eq_values(&original, &copy));

    copy.set("AttributeId", 1u32).unwrap();
    assert_eq!(
        original.get("AttributeId"),
        Some(&WireValue::UInt32(13)),
        "mutating the copy must not touch the original"
    );
}

fn structural_eq_values(a: &Structure, b: &Structure) -> bool {
    crate::clone_eq::structural_eq_structure(a, b)
}

#[test]
fn nested_values_clone_deeply() {
    let registry = test_registry();
    let mut request = registry.new_structure(&read_request_type()).unwrap();
    request
        .set(
            "NodesToRead",
            WireValue::Array(Some(vec![sample_read_value_id(&registry).into()])),
        )
        .unwrap();

    let mut copy = deep_clone_structure(&request);
    if let Some(WireValue::Array(Some(elements))) = copy.get("NodesToRead").cloned() {
        let mut element = match &elements[0] {
            WireValue::Structure(s) => s.clone(),
            other => panic!("unexpected value {:?}", other),
        };
        element.set("AttributeId", 7u32).unwrap();
        copy.set(
            "NodesToRead",
            WireValue::Array(Some(vec![element.into()])),
        )
        .unwrap();
    }

    match request.get("NodesToRead") {
        Some(WireValue::Array(Some(elements))) => match &elements[0] {
            WireValue::Structure(s) => {
                assert_eq!(s.get("AttributeId"), Some(&WireValue::UInt32(13)))
            }
            other => panic!("unexpected value {:?}", other),
        },
        other => panic!("unexpected value {:?}", other),
    }
}

#[test]
fn clones_share_the_schema() {
    let registry = test_registry();
    let original = sample_read_value_id(&registry);
    let copy = deep_clone_structure(&original);
    // Descriptors are immutable, so the Arc is shared rather than copied.
    assert!(std::sync::Arc::ptr_eq(original.descriptor(), copy.descriptor()));
}

#[test]
fn equality_and_hash_agree_for_structures() {
    let registry = test_registry();
    let a = WireValue::Structure(sample_read_value_id(&registry));
    let b = deep_clone(&a);
    assert!(structural_eq(&a, &b));
    assert_eq!(structural_hash(&a), structural_hash(&b));

    let mut different = sample_read_value_id(&registry);
    different.set("AttributeId", 1u32).unwrap();
    assert!(!structural_eq(&a, &WireValue::Structure(different)));
}

#[test]
fn diagnostic_chains_clone_their_buffers() {
    let inner = DiagnosticInfo {
        additional_info: Some(UAString::from("inner detail")),
        ..Default::default()
    };
    let value = WireValue::DiagnosticInfo(Box::new(DiagnosticInfo {
        symbolic_id: Some(1),
        inner_diagnostic_info: Some(Box::new(inner)),
        ..Default::default()
    }));
    let copy = deep_clone(&value);
    assert!(structural_eq(&value, &copy));
    assert_eq!(structural_hash(&value), structural_hash(&copy));
}
