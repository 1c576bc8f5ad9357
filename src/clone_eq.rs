// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Deep copy, structural equality and hashing over dynamic values.
//!
//! A deep clone owns every buffer of the original, so mutating one copy can
//! never show through the other. Schema descriptors stay shared behind
//! their `Arc`s; they are immutable after registry build, so sharing them
//! is safe and keeps a clone cheap in the common case.
//!
//! Equality and hashing agree: two values that compare equal hash equal.
//! Floats compare and hash by bit pattern here, so NaN equals NaN and the
//! two zero signs differ, which is what a codec needs for round-trip
//! checks.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use crate::value::{Structure, WireValue};

/// Clones a value so the copy shares no mutable state with the original.
pub fn deep_clone(value: &WireValue) -> WireValue {
    match value {
        WireValue::Structure(s) => WireValue::Structure(deep_clone_structure(s)),
        WireValue::Array(Some(elements)) => {
            WireValue::Array(Some(elements.iter().map(deep_clone).collect()))
        }
        WireValue::DiagnosticInfo(info) => WireValue::DiagnosticInfo(info.clone()),
        // Every other variant owns plain data; the derived clone is already
        // deep.
        other => other.clone(),
    }
}

/// Clones a structure field by field.
pub fn deep_clone_structure(structure: &Structure) -> Structure {
    let mut clone = structure.clone();
    for (field, value) in structure.iter() {
        let copied = deep_clone(value);
        // The clone has the same schema, so set cannot fail.
        if clone.set(&field.name, copied).is_err() {
            debug_assert!(false, "clone rejected its own field {}", field.name);
        }
    }
    clone
}

/// Structural equality: same kind, same contents, element by element.
/// Floats compare by bit pattern.
pub fn structural_eq(a: &WireValue, b: &WireValue) -> bool {
    match (a, b) {
        (WireValue::Float(x), WireValue::Float(y)) => x.to_bits() == y.to_bits(),
        (WireValue::Double(x), WireValue::Double(y)) => x.to_bits() == y.to_bits(),
        (WireValue::Array(Some(x)), WireValue::Array(Some(y))) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| structural_eq(a, b))
        }
        (WireValue::Structure(x), WireValue::Structure(y)) => structural_eq_structure(x, y),
        (a, b) => a == b,
    }
}

/// Structures are equal when they are of the same type and every field
/// compares structurally equal in schema order.
pub fn structural_eq_structure(a: &Structure, b: &Structure) -> bool {
    a.type_id() == b.type_id()
        && a.field_count() == b.field_count()
        && a.iter()
            .zip(b.iter())
            .all(|((_, x), (_, y))| structural_eq(x, y))
}

/// A structural hash consistent with [`structural_eq`].
pub fn structural_hash(value: &WireValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_equality_is_bitwise() {
        assert!(structural_eq(
            &WireValue::Double(f64::NAN),
            &WireValue::Double(f64::NAN)
        ));
        assert!(!structural_eq(
            &WireValue::Double(0.0),
            &WireValue::Double(-0.0)
        ));
    }

    #[test]
    fn equal_values_hash_equal() {
        let a = WireValue::Array(Some(vec![WireValue::Int32(1), WireValue::from("x")]));
        let b = deep_clone(&a);
        assert!(structural_eq(&a, &b));
        assert_eq!(structural_hash(&a), structural_hash(&b));
    }
}
