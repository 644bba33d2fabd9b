//! Validity of names and values.

use crate::NameError;
use nomen_primitives::{MAX_NAME_LENGTH, MAX_VALUE_LENGTH};
use serde::Deserialize;

/// Maximum nesting of arrays and objects in a value.
pub const MAX_JSON_DEPTH: usize = 512;

/// Checks that `name` is acceptable for registration.
///
/// A name is at most [`MAX_NAME_LENGTH`] bytes of UTF-8 without control characters
/// and starts with a namespace, one or more lower-case ASCII letters followed by `/`.
pub fn is_name_valid(name: &[u8]) -> Result<(), NameError> {
    if name.len() > MAX_NAME_LENGTH {
        return Err(NameError::NameTooLong);
    }

    match name.iter().position(|&b| !b.is_ascii_lowercase()) {
        Some(0) if name[0] == b'/' => return Err(NameError::EmptyNamespace),
        Some(i) if name[i] == b'/' => {}
        Some(_) => return Err(NameError::InvalidNamespace),
        None => return Err(NameError::NoNamespace),
    }

    // Bytes below 0x20 never occur inside multi-byte UTF-8 sequences.
    if name.iter().any(|&b| b < 0x20) {
        return Err(NameError::UnprintableAscii);
    }

    if std::str::from_utf8(name).is_err() {
        return Err(NameError::InvalidUtf8);
    }

    Ok(())
}

/// Checks that `value` is acceptable as the value of a name.
///
/// Values are at most [`MAX_VALUE_LENGTH`] bytes and must be a JSON object.
pub fn is_value_valid(value: &[u8]) -> Result<(), NameError> {
    if value.len() > MAX_VALUE_LENGTH {
        return Err(NameError::ValueTooLong);
    }

    if json_depth(value) > MAX_JSON_DEPTH {
        return Err(NameError::ValueInvalidJson);
    }

    // Numbers are kept as text, so no value is out of range.
    let mut de = serde_json::Deserializer::from_slice(value);
    de.disable_recursion_limit();
    let json = serde_json::Value::deserialize(&mut de).map_err(|_| NameError::ValueInvalidJson)?;
    de.end().map_err(|_| NameError::ValueInvalidJson)?;

    if !json.is_object() {
        return Err(NameError::ValueNotJsonObject);
    }

    Ok(())
}

/// Returns the deepest nesting of arrays and objects in `value`, ignoring brackets
/// inside strings. Only meaningful for well-formed JSON.
fn json_depth(value: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut max_depth = 0;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in value {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    max_depth
}
