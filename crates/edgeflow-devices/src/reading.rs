//! Conversion of pipeline values into readings.

use edgeflow_core::Reading;

use crate::value::TypedValue;

/// Build the reading for `value` as produced by `device_name`.
pub fn to_reading(value: &TypedValue, device_name: &str) -> Reading {
    Reading::new(
        device_name,
        value.resource.as_str(),
        value.to_string(),
        value.value_type(),
        value.origin,
    )
}
