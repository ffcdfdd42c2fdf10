//! Device service configuration.
//!
//! Defaults live here so every crate agrees on them. Values may be loaded
//! from a service file and then overridden from the environment.

use serde::{Deserialize, Serialize};

/// Default values.
pub mod defaults {
    /// Run the offset/scale/base transform on ingested values
    pub const DATA_TRANSFORM: bool = true;
    /// Pending batches buffered between drivers and the ingestion loop
    pub const QUEUE_CAPACITY: usize = 128;
    /// Event bus buffer for slow subscribers
    pub const EVENT_BUS_CAPACITY: usize = 1000;
}

/// Environment variable names.
pub mod env_vars {
    pub const DATA_TRANSFORM: &str = "EDGEFLOW_DATA_TRANSFORM";
    pub const QUEUE_CAPACITY: &str = "EDGEFLOW_QUEUE_CAPACITY";
    pub const EVENT_BUS_CAPACITY: &str = "EDGEFLOW_EVENT_BUS_CAPACITY";

    /// Parse a boolean flag the way operators usually write them.
    pub fn parse_flag(value: &str) -> Option<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

/// Settings consumed by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceServiceConfig {
    /// Whether ingested numeric values pass through the transform engine
    #[serde(default = "default_data_transform")]
    pub data_transform: bool,

    /// Capacity of the ingestion queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Capacity of the in-process event bus
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

fn default_data_transform() -> bool {
    defaults::DATA_TRANSFORM
}
fn default_queue_capacity() -> usize {
    defaults::QUEUE_CAPACITY
}
fn default_event_bus_capacity() -> usize {
    defaults::EVENT_BUS_CAPACITY
}

impl Default for DeviceServiceConfig {
    fn default() -> Self {
        Self {
            data_transform: default_data_transform(),
            queue_capacity: default_queue_capacity(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl DeviceServiceConfig {
    /// Override fields from environment variables that are set and valid.
    ///
    /// Invalid values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override fields using an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(env_vars::DATA_TRANSFORM) {
            match env_vars::parse_flag(&raw) {
                Some(flag) => self.data_transform = flag,
                None => tracing::warn!(
                    var = env_vars::DATA_TRANSFORM,
                    value = %raw,
                    "Ignoring invalid boolean override"
                ),
            }
        }

        if let Some(raw) = lookup(env_vars::QUEUE_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.queue_capacity = n,
                _ => tracing::warn!(
                    var = env_vars::QUEUE_CAPACITY,
                    value = %raw,
                    "Ignoring invalid queue capacity override"
                ),
            }
        }

        if let Some(raw) = lookup(env_vars::EVENT_BUS_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.event_bus_capacity = n,
                _ => tracing::warn!(
                    var = env_vars::EVENT_BUS_CAPACITY,
                    value = %raw,
                    "Ignoring invalid event bus capacity override"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DeviceServiceConfig::default();
        assert!(config.data_transform);
        assert_eq!(config.queue_capacity, defaults::QUEUE_CAPACITY);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: DeviceServiceConfig =
            serde_json::from_str(r#"{"data_transform": false}"#).unwrap();
        assert!(!config.data_transform);
        assert_eq!(config.queue_capacity, defaults::QUEUE_CAPACITY);
        assert_eq!(config.event_bus_capacity, defaults::EVENT_BUS_CAPACITY);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (env_vars::DATA_TRANSFORM, "off"),
            (env_vars::QUEUE_CAPACITY, "16"),
            (env_vars::EVENT_BUS_CAPACITY, "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = DeviceServiceConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert!(!config.data_transform);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.event_bus_capacity, defaults::EVENT_BUS_CAPACITY);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = DeviceServiceConfig::default();
        config.apply_overrides(|key| {
            (key == env_vars::QUEUE_CAPACITY).then(|| "0".to_string())
        });
        assert_eq!(config.queue_capacity, defaults::QUEUE_CAPACITY);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(env_vars::parse_flag("TRUE"), Some(true));
        assert_eq!(env_vars::parse_flag(" no "), Some(false));
        assert_eq!(env_vars::parse_flag("maybe"), None);
    }
}
