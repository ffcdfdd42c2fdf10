//! Readings and events handed to the downstream data store.
//!
//! A [`Reading`] is the normalized, stringified form of one device value.
//! An [`Event`] groups the readings produced from a single ingestion batch
//! for one device.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type tag carried by every device value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    String,
}

impl ValueType {
    /// All tags, in declaration order.
    pub const ALL: [ValueType; 12] = [
        Self::Uint8,
        Self::Uint16,
        Self::Uint32,
        Self::Uint64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float32,
        Self::Float64,
        Self::Bool,
        Self::String,
    ];

    /// Unsigned integer types; their text form never carries a sign.
    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized device reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Unique reading identifier
    pub id: Uuid,
    /// Device that produced the value
    pub device: String,
    /// Resource (device object) name
    pub name: String,
    /// Canonical string form of the value
    pub value: String,
    /// Type tag of the value
    pub value_type: ValueType,
    /// Origin timestamp reported by the driver (milliseconds)
    pub origin: i64,
}

impl Reading {
    pub fn new(
        device: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
        value_type: ValueType,
        origin: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            device: device.into(),
            name: name.into(),
            value: value.into(),
            value_type,
            origin,
        }
    }
}

/// Readings produced from one ingestion batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier
    pub id: Uuid,
    /// Device name
    pub device: String,
    /// Creation timestamp (milliseconds)
    pub origin: i64,
    /// Readings in batch order
    pub readings: Vec<Reading>,
}

impl Event {
    pub fn new(device: impl Into<String>, readings: Vec<Reading>) -> Self {
        Self {
            id: Uuid::new_v4(),
            device: device.into(),
            origin: chrono::Utc::now().timestamp_millis(),
            readings,
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
