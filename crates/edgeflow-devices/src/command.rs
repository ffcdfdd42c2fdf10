//! Write-path preparation of command parameters.
//!
//! Command callers supply parameters as text in engineering units. Before a
//! driver can write them, they are parsed into the resource's value type
//! and converted back to raw device units with the write-direction
//! transform.

use crate::profile::Resource;
use crate::registry::MetadataResolver;
use crate::transform::{transform_write, TransformError};
use crate::value::{TypedValue, ValueError};

/// Errors preparing a write.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Resource {resource} not found in profile {profile}")]
    ResourceNotFound { profile: String, resource: String },

    #[error("Resource {0} is read-only")]
    ReadOnly(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(#[from] ValueError),

    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),
}

/// Resolve `resource_name` on `device_name` and convert `parameter` into the
/// raw value the driver should write.
///
/// The transform is skipped when `data_transform` is off.
pub fn prepare_write(
    resolver: &dyn MetadataResolver,
    data_transform: bool,
    device_name: &str,
    resource_name: &str,
    parameter: &str,
) -> Result<TypedValue, CommandError> {
    let device = resolver
        .resolve_device(device_name)
        .ok_or_else(|| CommandError::DeviceNotFound(device_name.to_string()))?;

    let resource = resolver
        .resolve_resource(&device.profile, resource_name)
        .ok_or_else(|| CommandError::ResourceNotFound {
            profile: device.profile.clone(),
            resource: resource_name.to_string(),
        })?;

    prepare_resource_write(&resource, data_transform, parameter)
}

/// Convert `parameter` for an already resolved resource.
pub fn prepare_resource_write(
    resource: &Resource,
    data_transform: bool,
    parameter: &str,
) -> Result<TypedValue, CommandError> {
    if !resource.read_write.is_writable() {
        return Err(CommandError::ReadOnly(resource.name.clone()));
    }

    let origin = chrono::Utc::now().timestamp_millis();
    let value = TypedValue::parse(resource.value_type, resource.name.as_str(), origin, parameter)?;

    if !data_transform {
        return Ok(value);
    }

    let raw = transform_write(&value, &resource.transform)?;
    tracing::debug!(
        resource = %resource.name,
        parameter,
        raw = %raw,
        "Prepared write parameter"
    );
    Ok(raw)
}
