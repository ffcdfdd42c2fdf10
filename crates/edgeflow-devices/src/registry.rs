//! Device Registry - metadata lookup for the ingestion pipeline
//!
//! The pipeline only ever reads metadata through [`MetadataResolver`].
//! [`DeviceRegistry`] is the in-memory implementation: concurrent maps of
//! profiles and devices that drivers and the ingestion loop can query at
//! the same time while configuration code registers new entries.

use dashmap::DashMap;
use std::sync::Arc;

use crate::profile::{Device, Profile, Resource};

/// Read-only metadata queries used by the pipeline.
///
/// Implementations must be safe for concurrent readers.
pub trait MetadataResolver: Send + Sync {
    /// Look up a device by name.
    fn resolve_device(&self, name: &str) -> Option<Device>;

    /// Look up a resource within a profile.
    fn resolve_resource(&self, profile: &str, resource: &str) -> Option<Resource>;
}

impl<R: MetadataResolver + ?Sized> MetadataResolver for Arc<R> {
    fn resolve_device(&self, name: &str) -> Option<Device> {
        (**self).resolve_device(name)
    }

    fn resolve_resource(&self, profile: &str, resource: &str) -> Option<Resource> {
        (**self).resolve_resource(profile, resource)
    }
}

/// Shared resolver handle.
pub type SharedResolver = Arc<dyn MetadataResolver>;

/// Errors raised while registering metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Device references a profile that has not been registered
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Profile still referenced by devices
    #[error("Profile {profile} is used by {devices} device(s)")]
    ProfileInUse { profile: String, devices: usize },
}

/// In-memory device and profile store.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    profiles: DashMap<String, Profile>,
    devices: DashMap<String, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a profile.
    pub fn register_profile(&self, profile: Profile) {
        let name = profile.name.clone();
        if self.profiles.insert(name.clone(), profile).is_some() {
            tracing::debug!(profile = %name, "Replaced existing profile");
        } else {
            tracing::debug!(profile = %name, "Registered profile");
        }
    }

    /// Register or replace a device.
    ///
    /// The device's profile must already be registered.
    pub fn register_device(&self, device: Device) -> Result<(), RegistryError> {
        if !self.profiles.contains_key(&device.profile) {
            return Err(RegistryError::ProfileNotFound(device.profile));
        }
        let name = device.name.clone();
        if self.devices.insert(name.clone(), device).is_some() {
            tracing::debug!(device = %name, "Replaced existing device");
        } else {
            tracing::debug!(device = %name, "Registered device");
        }
        Ok(())
    }

    pub fn remove_device(&self, name: &str) -> Result<Device, RegistryError> {
        self.devices
            .remove(name)
            .map(|(_, device)| device)
            .ok_or_else(|| RegistryError::DeviceNotFound(name.to_string()))
    }

    /// Remove a profile that no device refers to any more.
    pub fn remove_profile(&self, name: &str) -> Result<Profile, RegistryError> {
        let users = self
            .devices
            .iter()
            .filter(|entry| entry.value().profile == name)
            .count();
        if users > 0 {
            return Err(RegistryError::ProfileInUse {
                profile: name.to_string(),
                devices: users,
            });
        }
        self.profiles
            .remove(name)
            .map(|(_, profile)| profile)
            .ok_or_else(|| RegistryError::ProfileNotFound(name.to_string()))
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }
}

impl MetadataResolver for DeviceRegistry {
    fn resolve_device(&self, name: &str) -> Option<Device> {
        self.devices.get(name).map(|entry| entry.value().clone())
    }

    fn resolve_resource(&self, profile: &str, resource: &str) -> Option<Resource> {
        self.profiles
            .get(profile)
            .and_then(|entry| entry.value().resource(resource).cloned())
    }
}
