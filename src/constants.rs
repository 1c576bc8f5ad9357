// UA Wire for Rust
// SPDX-License-Identifier: MPL-2.0

//! Protocol hardening limits applied while encoding and decoding. These are
//! deliberately conservative defaults; peers negotiate their own limits at a
//! layer above this crate and may override them through `DecodingOptions`.

/// Maximum size in bytes of a decoded string.
pub const MAX_STRING_LENGTH: usize = 65535;
/// Maximum size in bytes of a decoded byte string.
pub const MAX_BYTE_STRING_LENGTH: usize = 65535;
/// Maximum number of elements in a decoded or encoded array.
pub const MAX_ARRAY_LENGTH: usize = 65535;
/// Maximum recursion depth for nested structures and extension objects.
pub const MAX_DECODING_DEPTH: usize = 10;
