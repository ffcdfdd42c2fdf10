//! Discrete value mapping.

use crate::profile::ValueMapping;
use crate::value::TypedValue;

/// Substitute the mapped representation of `value`.
///
/// Returns the string-tagged mapped value and `true` on a hit. On a miss,
/// or when `mappings` is empty, the original value is returned with `false`.
/// The first matching entry wins.
pub fn map_value(value: &TypedValue, mappings: &[ValueMapping]) -> (TypedValue, bool) {
    if mappings.is_empty() {
        return (value.clone(), false);
    }

    let raw = value.to_string();
    match mappings.iter().find(|m| m.raw == raw) {
        Some(m) => (
            TypedValue::string(value.resource.clone(), value.origin, m.mapped.clone()),
            true,
        ),
        None => (value.clone(), false),
    }
}
