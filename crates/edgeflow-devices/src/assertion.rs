//! Expected-value assertions on resource values.

use crate::profile::Device;
use crate::value::TypedValue;

/// A value did not match its resource's assertion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("assertion failed for device {device}, resource {resource}: got {actual:?}, expected {expected:?}")]
pub struct AssertionError {
    pub device: String,
    pub resource: String,
    pub actual: String,
    pub expected: String,
}

/// Compare the canonical string form of `value` with `assertion`.
///
/// An empty assertion always passes. Neither the device nor the value is
/// modified; the caller decides how a failure is represented downstream.
pub fn check_assertion(
    value: &TypedValue,
    assertion: &str,
    device: &Device,
) -> Result<(), AssertionError> {
    if assertion.is_empty() {
        return Ok(());
    }

    let actual = value.to_string();
    if actual == assertion {
        return Ok(());
    }

    Err(AssertionError {
        device: device.name.clone(),
        resource: value.resource.clone(),
        actual,
        expected: assertion.to_string(),
    })
}
