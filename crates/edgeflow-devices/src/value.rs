//! Typed device values.
//!
//! Drivers hand the pipeline [`TypedValue`]s: a [`Scalar`] payload tagged
//! with one of the closed set of value types, plus the resource it was read
//! from and the driver's origin timestamp.

use serde::{Deserialize, Serialize};

use edgeflow_core::ValueType;

/// Scalar payload of a device value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Scalar {
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    String(String),
}

impl Scalar {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Uint8(_) => ValueType::Uint8,
            Self::Uint16(_) => ValueType::Uint16,
            Self::Uint32(_) => ValueType::Uint32,
            Self::Uint64(_) => ValueType::Uint64,
            Self::Int8(_) => ValueType::Int8,
            Self::Int16(_) => ValueType::Int16,
            Self::Int32(_) => ValueType::Int32,
            Self::Int64(_) => ValueType::Int64,
            Self::Float32(_) => ValueType::Float32,
            Self::Float64(_) => ValueType::Float64,
            Self::Bool(_) => ValueType::Bool,
            Self::String(_) => ValueType::String,
        }
    }

    /// Parse text into a scalar of the given type.
    pub fn parse(value_type: ValueType, text: &str) -> Result<Self, ValueError> {
        fn num<T: std::str::FromStr>(
            text: &str,
            value_type: ValueType,
        ) -> Result<T, ValueError>
        where
            T::Err: std::fmt::Display,
        {
            let trimmed = text.trim();
            if value_type.is_unsigned() && trimmed.starts_with('+') {
                return Err(ValueError::Parse {
                    text: text.to_string(),
                    value_type,
                    reason: "unsigned value must not carry a sign".to_string(),
                });
            }
            trimmed.parse::<T>().map_err(|e| ValueError::Parse {
                text: text.to_string(),
                value_type,
                reason: e.to_string(),
            })
        }

        Ok(match value_type {
            ValueType::Uint8 => Self::Uint8(num(text, value_type)?),
            ValueType::Uint16 => Self::Uint16(num(text, value_type)?),
            ValueType::Uint32 => Self::Uint32(num(text, value_type)?),
            ValueType::Uint64 => Self::Uint64(num(text, value_type)?),
            ValueType::Int8 => Self::Int8(num(text, value_type)?),
            ValueType::Int16 => Self::Int16(num(text, value_type)?),
            ValueType::Int32 => Self::Int32(num(text, value_type)?),
            ValueType::Int64 => Self::Int64(num(text, value_type)?),
            ValueType::Float32 => Self::Float32(num(text, value_type)?),
            ValueType::Float64 => Self::Float64(num(text, value_type)?),
            ValueType::Bool => Self::Bool(num(text, value_type)?),
            ValueType::String => Self::String(text.to_string()),
        })
    }
}

/// Canonical string form, used for readings, assertions and mappings.
impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uint8(v) => write!(f, "{}", v),
            Self::Uint16(v) => write!(f, "{}", v),
            Self::Uint32(v) => write!(f, "{}", v),
            Self::Uint64(v) => write!(f, "{}", v),
            Self::Int8(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
        }
    }
}

/// A value produced by a device driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    /// Resource (device object) the value belongs to
    pub resource: String,
    /// Origin timestamp reported by the driver (milliseconds)
    #[serde(default)]
    pub origin: i64,
    /// Tagged payload
    pub value: Scalar,
}

impl TypedValue {
    pub fn new(resource: impl Into<String>, origin: i64, value: Scalar) -> Self {
        Self {
            resource: resource.into(),
            origin,
            value,
        }
    }

    /// String-tagged value for the same resource and origin.
    pub fn string(resource: impl Into<String>, origin: i64, text: impl Into<String>) -> Self {
        Self::new(resource, origin, Scalar::String(text.into()))
    }

    /// Parse a textual parameter into a value of the given type.
    pub fn parse(
        value_type: ValueType,
        resource: impl Into<String>,
        origin: i64,
        text: &str,
    ) -> Result<Self, ValueError> {
        Ok(Self::new(resource, origin, Scalar::parse(value_type, text)?))
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// Same resource and origin, new payload.
    pub fn with_scalar(&self, value: Scalar) -> Self {
        Self {
            resource: self.resource.clone(),
            origin: self.origin,
            value,
        }
    }
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

/// Errors building values from text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("Cannot parse {text:?} as {value_type}: {reason}")]
    Parse {
        text: String,
        value_type: ValueType,
        reason: String,
    },
}
