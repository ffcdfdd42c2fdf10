//! Service file loading.
//!
//! A service file is TOML holding the `[service]` settings plus the
//! profiles and devices to register:
//!
//! ```toml
//! [service]
//! data_transform = true
//!
//! [[profiles]]
//! name = "boiler"
//!
//! [[profiles.resources]]
//! name = "Temperature"
//! value_type = "uint8"
//! transform = { offset = "2" }
//!
//! [[devices]]
//! name = "boiler-1"
//! profile = "boiler"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use edgeflow_core::DeviceServiceConfig;
use edgeflow_devices::{Device, DeviceRegistry, Profile};

#[derive(Debug, Default, Deserialize)]
pub struct ServiceFile {
    #[serde(default)]
    pub service: DeviceServiceConfig,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl ServiceFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read service file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid service file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Register every profile, then every device.
    pub fn build_registry(&self) -> Result<DeviceRegistry> {
        let registry = DeviceRegistry::new();
        for profile in &self.profiles {
            registry.register_profile(profile.clone());
        }
        for device in &self.devices {
            registry
                .register_device(device.clone())
                .with_context(|| format!("Cannot register device {}", device.name))?;
        }
        tracing::info!(
            profiles = registry.profile_count(),
            devices = registry.device_count(),
            "Metadata loaded"
        );
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeflow_core::ValueType;
    use edgeflow_devices::MetadataResolver;
    use std::io::Write;

    const SAMPLE: &str = r#"
[service]
data_transform = false
queue_capacity = 4

[[profiles]]
name = "boiler"

[[profiles.resources]]
name = "Temperature"
value_type = "uint8"
transform = { offset = "2", assertion = "" }

[[profiles.resources]]
name = "Burner"
value_type = "string"
read_write = "R"
transform = { mappings = [{ raw = "1", mapped = "On" }, { raw = "0", mapped = "Off" }] }

[[devices]]
name = "boiler-1"
profile = "boiler"
labels = { site = "basement" }
"#;

    #[test]
    fn test_parse_sample() {
        let file = ServiceFile::parse(SAMPLE).unwrap();
        assert!(!file.service.data_transform);
        assert_eq!(file.service.queue_capacity, 4);

        let registry = file.build_registry().unwrap();
        let resource = registry.resolve_resource("boiler", "Temperature").unwrap();
        assert_eq!(resource.value_type, ValueType::Uint8);
        assert_eq!(resource.transform.active_offset(), Some("2"));

        let burner = registry.resolve_resource("boiler", "Burner").unwrap();
        assert_eq!(burner.transform.mapping_for("0"), Some("Off"));

        let device = registry.resolve_device("boiler-1").unwrap();
        assert_eq!(device.labels.get("site").map(String::as_str), Some("basement"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = ServiceFile::parse("").unwrap();
        assert_eq!(file.service, DeviceServiceConfig::default());
        assert!(file.profiles.is_empty());
    }

    #[test]
    fn test_device_with_unknown_profile_is_rejected() {
        let file = ServiceFile::parse(
            r#"
[[devices]]
name = "pump-1"
profile = "pump"
"#,
        )
        .unwrap();
        let err = file.build_registry().unwrap_err();
        assert!(err.to_string().contains("pump-1"));
    }

    #[test]
    fn test_load_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(SAMPLE.as_bytes()).unwrap();
        let file = ServiceFile::load(tmp.path()).unwrap();
        assert_eq!(file.devices.len(), 1);

        assert!(ServiceFile::load(Path::new("/nonexistent/edgeflow.toml")).is_err());
    }
}
