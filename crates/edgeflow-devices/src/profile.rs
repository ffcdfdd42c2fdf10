//! Device and profile metadata.
//!
//! A [`Profile`] is the named schema of resources a device exposes. Each
//! [`Resource`] carries the [`TransformSpec`] applied to its values on the
//! way in (read) and on the way out (write).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use edgeflow_core::ValueType;

/// Identity operand for the offset step.
pub const DEFAULT_OFFSET: &str = "0";
/// Identity operand for the scale step.
pub const DEFAULT_SCALE: &str = "1";
/// Identity operand for the base step.
pub const DEFAULT_BASE: &str = "0";

/// One raw → mapped entry of a resource's mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMapping {
    /// Canonical string form of the raw value
    pub raw: String,
    /// Representation substituted for it
    pub mapped: String,
}

impl ValueMapping {
    pub fn new(raw: impl Into<String>, mapped: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            mapped: mapped.into(),
        }
    }
}

/// Per-resource value transformation settings.
///
/// Numeric operands are kept as written in the profile; they are parsed
/// against the type of each value when the transform runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Expected canonical value; empty means no assertion
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assertion: String,
    /// Ordered discrete value mappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<ValueMapping>,
}

impl TransformSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = Some(scale.into());
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_assertion(mut self, assertion: impl Into<String>) -> Self {
        self.assertion = assertion.into();
        self
    }

    pub fn with_mapping(mut self, raw: impl Into<String>, mapped: impl Into<String>) -> Self {
        self.mappings.push(ValueMapping::new(raw, mapped));
        self
    }

    /// Offset operand, if the step is active.
    pub fn active_offset(&self) -> Option<&str> {
        active(self.offset.as_deref(), DEFAULT_OFFSET)
    }

    /// Scale operand, if the step is active.
    pub fn active_scale(&self) -> Option<&str> {
        active(self.scale.as_deref(), DEFAULT_SCALE)
    }

    /// Base operand, if the step is active.
    pub fn active_base(&self) -> Option<&str> {
        active(self.base.as_deref(), DEFAULT_BASE)
    }

    /// First mapping whose raw side equals `raw`.
    pub fn mapping_for(&self, raw: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.raw == raw)
            .map(|m| m.mapped.as_str())
    }
}

fn active<'a>(operand: Option<&'a str>, identity: &str) -> Option<&'a str> {
    operand
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != identity)
}

impl std::fmt::Display for TransformSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{offset: {}, scale: {}, base: {}, assertion: {:?}}}",
            self.offset.as_deref().unwrap_or(DEFAULT_OFFSET),
            self.scale.as_deref().unwrap_or(DEFAULT_SCALE),
            self.base.as_deref().unwrap_or(DEFAULT_BASE),
            self.assertion
        )
    }
}

/// Access mode of a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadWrite {
    #[serde(rename = "R")]
    Read,
    #[serde(rename = "W")]
    Write,
    #[default]
    #[serde(rename = "RW")]
    ReadWrite,
}

impl ReadWrite {
    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// A named data point on a device (device object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Type of the values this resource produces and accepts
    pub value_type: ValueType,
    #[serde(default)]
    pub read_write: ReadWrite,
    #[serde(default)]
    pub transform: TransformSpec,
}

impl Resource {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            value_type,
            read_write: ReadWrite::default(),
            transform: TransformSpec::default(),
        }
    }

    pub fn with_transform(mut self, transform: TransformSpec) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_read_write(mut self, read_write: ReadWrite) -> Self {
        self.read_write = read_write;
        self
    }
}

/// Named schema of the resources a device exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            resources: Vec::new(),
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }
}

/// A device instance bound to a profile by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    /// Profile name
    pub profile: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Device {
    pub fn new(name: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: profile.into(),
            description: String::new(),
            labels: HashMap::new(),
        }
    }
}
