//! Internal utility functions and helpers.
//!
//! This module contains small helper functions used throughout the crate.
//! It is an implementation detail and not part of the public API.

use std::fmt::Write;

/// Percent-encodes `value` as an RFC 5987 `value-chars` sequence.
///
/// The UTF-8 bytes of `value` are kept as-is when they are `attr-char`s and
/// written as `%XX` (uppercase hex) otherwise.
pub(crate) fn encode_ext_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for &byte in value.as_bytes() {
        if is_attr_char(byte) {
            encoded.push(byte as char);
        } else {
            // Writing into a String cannot fail.
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

fn is_attr_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}
