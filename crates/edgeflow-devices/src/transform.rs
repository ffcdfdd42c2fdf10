//! Value transform engine.
//!
//! Converts between raw device units and engineering units using the
//! offset, scale and base operands of a resource's [`TransformSpec`].
//!
//! ## Direction
//!
//! | Step   | Write (engineering → raw)   | Read (raw → engineering) |
//! |--------|-----------------------------|--------------------------|
//! | offset | `v - offset`                | `v + offset`             |
//! | scale  | `v / scale`                 | `v * scale`              |
//! | base   | `ln(v) / ln(base)`          | `base ^ v`               |
//!
//! Write runs offset → scale → base. Read runs the inverse steps in reverse
//! order (base → scale → offset) so a write undoes a prior read.
//!
//! String and boolean values pass through untouched. Every numeric result
//! keeps the tag of its input.

use serde::{Deserialize, Serialize};

use edgeflow_core::ValueType;

use crate::numeric::Numeric;
use crate::profile::TransformSpec;
use crate::value::{Scalar, TypedValue};

/// Which way a value is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Device → pipeline
    Read,
    /// Command → device
    Write,
}

/// Transform step, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Offset,
    Scale,
    Base,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offset => f.write_str("offset"),
            Self::Scale => f.write_str("scale"),
            Self::Base => f.write_str("base"),
        }
    }
}

/// Errors produced by the transform engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Operand cannot be represented in the value's type
    #[error("the {step} {operand:?} cannot be parsed to {value_type}: {reason}")]
    Parse {
        step: Step,
        operand: String,
        value_type: ValueType,
        reason: String,
    },

    /// Arithmetic the value's type cannot perform
    #[error("{step} of {value_type} failed: {reason}")]
    Arithmetic {
        step: Step,
        value_type: ValueType,
        reason: String,
    },
}

impl TransformError {
    pub fn step(&self) -> Step {
        match self {
            Self::Parse { step, .. } | Self::Arithmetic { step, .. } => *step,
        }
    }
}

/// Apply `spec` to `value` in the given direction.
///
/// The first failing step aborts the remaining ones for this value.
pub fn transform(
    value: &TypedValue,
    spec: &TransformSpec,
    direction: Direction,
) -> Result<TypedValue, TransformError> {
    let scalar = match &value.value {
        Scalar::Uint8(v) => apply(*v, spec, direction)?,
        Scalar::Uint16(v) => apply(*v, spec, direction)?,
        Scalar::Uint32(v) => apply(*v, spec, direction)?,
        Scalar::Uint64(v) => apply(*v, spec, direction)?,
        Scalar::Int8(v) => apply(*v, spec, direction)?,
        Scalar::Int16(v) => apply(*v, spec, direction)?,
        Scalar::Int32(v) => apply(*v, spec, direction)?,
        Scalar::Int64(v) => apply(*v, spec, direction)?,
        Scalar::Float32(v) => apply(*v, spec, direction)?,
        Scalar::Float64(v) => apply(*v, spec, direction)?,
        Scalar::Bool(_) | Scalar::String(_) => return Ok(value.clone()),
    };

    if scalar != value.value {
        tracing::trace!(
            resource = %value.resource,
            from = %value.value,
            to = %scalar,
            ?direction,
            "Value transformed"
        );
    }
    Ok(value.with_scalar(scalar))
}

/// Read-direction transform of a driver value.
pub fn transform_read(value: &TypedValue, spec: &TransformSpec) -> Result<TypedValue, TransformError> {
    transform(value, spec, Direction::Read)
}

/// Write-direction transform of a command parameter.
pub fn transform_write(value: &TypedValue, spec: &TransformSpec) -> Result<TypedValue, TransformError> {
    transform(value, spec, Direction::Write)
}

fn apply<T>(mut v: T, spec: &TransformSpec, direction: Direction) -> Result<Scalar, TransformError>
where
    T: Numeric,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    match direction {
        Direction::Write => {
            if let Some(operand) = spec.active_offset() {
                v = v.sub(parse_operand::<T>(operand, Step::Offset)?);
            }
            if let Some(operand) = spec.active_scale() {
                let scale = parse_operand::<T>(operand, Step::Scale)?;
                v = v.div(scale).ok_or_else(divide_by_zero::<T>)?;
            }
            if let Some(operand) = spec.active_base() {
                if let Some(base) = parse_base::<T>(operand)? {
                    v = T::from_f64(v.to_f64().ln() / base.ln());
                }
            }
        }
        Direction::Read => {
            if let Some(operand) = spec.active_base() {
                if let Some(base) = parse_base::<T>(operand)? {
                    v = T::from_f64(base.powf(v.to_f64()));
                }
            }
            if let Some(operand) = spec.active_scale() {
                let scale = parse_operand::<T>(operand, Step::Scale)?;
                if scale.is_zero() && !T::VALUE_TYPE.is_float() {
                    return Err(divide_by_zero::<T>());
                }
                v = v.mul(scale);
            }
            if let Some(operand) = spec.active_offset() {
                v = v.add(parse_operand::<T>(operand, Step::Offset)?);
            }
        }
    }
    Ok(v.into_scalar())
}

fn parse_operand<T>(operand: &str, step: Step) -> Result<T, TransformError>
where
    T: Numeric,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    let parsed = if T::VALUE_TYPE.is_unsigned() && operand.starts_with('+') {
        Err("unsigned operand must not carry a sign".to_string())
    } else {
        operand.parse::<T>().map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| {
        tracing::error!(
            %step,
            operand,
            value_type = %T::VALUE_TYPE,
            "Transform operand cannot be parsed: {}",
            reason
        );
        TransformError::Parse {
            step,
            operand: operand.to_string(),
            value_type: T::VALUE_TYPE,
            reason,
        }
    })
}

/// Base operands are always evaluated in double precision. A zero base
/// means the step is skipped.
fn parse_base<T: Numeric>(operand: &str) -> Result<Option<f64>, TransformError> {
    let base = operand.parse::<f64>().map_err(|e| {
        tracing::error!(
            step = %Step::Base,
            operand,
            value_type = %T::VALUE_TYPE,
            "Transform operand cannot be parsed: {}",
            e
        );
        TransformError::Parse {
            step: Step::Base,
            operand: operand.to_string(),
            value_type: T::VALUE_TYPE,
            reason: e.to_string(),
        }
    })?;
    Ok((base != 0.0).then_some(base))
}

fn divide_by_zero<T: Numeric>() -> TransformError {
    TransformError::Arithmetic {
        step: Step::Scale,
        value_type: T::VALUE_TYPE,
        reason: "scale operand is zero".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tv(value: Scalar) -> TypedValue {
        TypedValue::new("Resource", 1_000, value)
    }

    fn offset(o: &str) -> TransformSpec {
        TransformSpec::new().with_offset(o)
    }

    #[test]
    fn test_offset_example() {
        let spec = TransformSpec::new()
            .with_offset("2")
            .with_scale("1")
            .with_base("0");

        let read = transform_read(&tv(Scalar::Uint8(10)), &spec).unwrap();
        assert_eq!(read.value, Scalar::Uint8(12));
        assert_eq!(read.resource, "Resource");
        assert_eq!(read.origin, 1_000);

        let written = transform_write(&read, &spec).unwrap();
        assert_eq!(written.value, Scalar::Uint8(10));
    }

    fn every_tag() -> [Scalar; 12] {
        [
            Scalar::Uint8(200),
            Scalar::Uint16(65_000),
            Scalar::Uint32(7),
            Scalar::Uint64(u64::MAX),
            Scalar::Int8(-100),
            Scalar::Int16(-1),
            Scalar::Int32(i32::MIN),
            Scalar::Int64(42),
            Scalar::Float32(-1.25),
            Scalar::Float64(3.5e9),
            Scalar::Bool(false),
            Scalar::String("idle".into()),
        ]
    }

    #[test]
    fn test_identity_spec_for_every_tag() {
        let spec = TransformSpec::new()
            .with_offset("0")
            .with_scale("1")
            .with_base("0");
        for value in every_tag() {
            for direction in [Direction::Read, Direction::Write] {
                let out = transform(&tv(value.clone()), &spec, direction).unwrap();
                assert_eq!(out.value, value);
            }
        }
    }

    #[test]
    fn test_string_and_bool_bypass_bad_operands() {
        let spec = TransformSpec::new()
            .with_offset("not a number")
            .with_scale("0")
            .with_base("x");
        for value in [Scalar::Bool(true), Scalar::String("abc".into())] {
            let out = transform_read(&tv(value.clone()), &spec).unwrap();
            assert_eq!(out.value, value);
        }
    }

    #[test]
    fn test_offset_round_trip_integers_wrap() {
        let cases = [
            (Scalar::Uint8(250), "10"),
            (Scalar::Uint16(3), "65535"),
            (Scalar::Uint32(u32::MAX), "1"),
            (Scalar::Uint64(0), "18446744073709551615"),
            (Scalar::Int8(i8::MAX), "5"),
            (Scalar::Int16(i16::MIN), "-3"),
            (Scalar::Int32(-17), "100"),
            (Scalar::Int64(i64::MAX), "9"),
        ];
        for (value, o) in cases {
            let spec = offset(o);
            let read = transform_read(&tv(value.clone()), &spec).unwrap();
            assert_eq!(read.value_type(), value.value_type());
            let back = transform_write(&read, &spec).unwrap();
            assert_eq!(back.value, value, "offset {} on {:?}", o, value);
        }
        let wrapped = transform_read(&tv(Scalar::Uint8(250)), &offset("10")).unwrap();
        assert_eq!(wrapped.value, Scalar::Uint8(4));
    }

    #[test]
    fn test_offset_round_trip_floats() {
        for (v, o) in [(1.5f64, "0.1"), (-273.15, "273.15"), (1e10, "-3.3")] {
            let spec = offset(o);
            let read = transform_read(&tv(Scalar::Float64(v)), &spec).unwrap();
            let back = transform_write(&read, &spec).unwrap();
            match back.value {
                Scalar::Float64(b) => assert!((b - v).abs() <= 1e-9 * v.abs().max(1.0)),
                other => panic!("unexpected {:?}", other),
            }
        }

        let spec = offset("0.5");
        let read = transform_read(&tv(Scalar::Float32(2.25)), &spec).unwrap();
        assert_eq!(read.value, Scalar::Float32(2.75));
        let back = transform_write(&read, &spec).unwrap();
        assert_eq!(back.value, Scalar::Float32(2.25));
    }

    #[test]
    fn test_scale() {
        let spec = TransformSpec::new().with_scale("10");
        let read = transform_read(&tv(Scalar::Int16(-12)), &spec).unwrap();
        assert_eq!(read.value, Scalar::Int16(-120));

        let written = transform_write(&tv(Scalar::Int16(-125)), &spec).unwrap();
        assert_eq!(written.value, Scalar::Int16(-12));

        let spec = TransformSpec::new().with_scale("0.5");
        let read = transform_read(&tv(Scalar::Float32(3.0)), &spec).unwrap();
        assert_eq!(read.value, Scalar::Float32(1.5));
    }

    #[test]
    fn test_integer_scale_zero_is_arithmetic_error() {
        let spec = TransformSpec::new().with_scale("0");
        for direction in [Direction::Read, Direction::Write] {
            for value in [Scalar::Uint8(1), Scalar::Int64(-5), Scalar::Uint32(0)] {
                let err = transform(&tv(value), &spec, direction).unwrap_err();
                assert!(matches!(
                    err,
                    TransformError::Arithmetic {
                        step: Step::Scale,
                        ..
                    }
                ));
            }
        }
    }

    #[test]
    fn test_float_scale_zero_is_ieee() {
        let spec = TransformSpec::new().with_scale("0");
        let written = transform_write(&tv(Scalar::Float64(1.0)), &spec).unwrap();
        assert_eq!(written.value, Scalar::Float64(f64::INFINITY));
    }

    #[test]
    fn test_base_zero_is_noop() {
        for base in ["0", "0.0", " 0 "] {
            let spec = TransformSpec::new().with_base(base);
            for value in every_tag() {
                for direction in [Direction::Read, Direction::Write] {
                    let out = transform(&tv(value.clone()), &spec, direction).unwrap();
                    assert_eq!(out.value, value, "base {base:?}, {direction:?}");
                }
            }
        }
    }

    #[test]
    fn test_base() {
        let spec = TransformSpec::new().with_base("2");
        let read = transform_read(&tv(Scalar::Uint16(10)), &spec).unwrap();
        assert_eq!(read.value, Scalar::Uint16(1024));

        let written = transform_write(&tv(Scalar::Uint16(1024)), &spec).unwrap();
        assert_eq!(written.value, Scalar::Uint16(10));

        // log2(1000) = 9.96..., truncated toward zero
        let written = transform_write(&tv(Scalar::Uint16(1000)), &spec).unwrap();
        assert_eq!(written.value, Scalar::Uint16(9));

        let written = transform_write(&tv(Scalar::Float64(8.0)), &spec).unwrap();
        assert_eq!(written.value, Scalar::Float64(3.0));
    }

    #[test]
    fn test_full_round_trip() {
        let spec = TransformSpec::new()
            .with_offset("-40")
            .with_scale("3")
            .with_base("10");
        let raw = tv(Scalar::Int64(2));
        let read = transform_read(&raw, &spec).unwrap();
        assert_eq!(read.value, Scalar::Int64(260));
        let back = transform_write(&read, &spec).unwrap();
        assert_eq!(back.value, Scalar::Int64(2));
    }

    #[test]
    fn test_parse_errors_name_step_and_type() {
        let spec = TransformSpec::new().with_offset("-1");
        let err = transform_read(&tv(Scalar::Uint8(3)), &spec).unwrap_err();
        match &err {
            TransformError::Parse {
                step,
                operand,
                value_type,
                ..
            } => {
                assert_eq!(*step, Step::Offset);
                assert_eq!(operand, "-1");
                assert_eq!(*value_type, ValueType::Uint8);
            }
            other => panic!("unexpected {:?}", other),
        }
        let msg = err.to_string();
        assert!(msg.contains("offset"));
        assert!(msg.contains("uint8"));

        let spec = TransformSpec::new().with_scale("300");
        let err = transform_write(&tv(Scalar::Uint8(3)), &spec).unwrap_err();
        assert_eq!(err.step(), Step::Scale);

        let spec = TransformSpec::new().with_base("ten");
        let err = transform_write(&tv(Scalar::Float32(3.0)), &spec).unwrap_err();
        assert_eq!(err.step(), Step::Base);
    }

    #[test]
    fn test_plus_sign_operand() {
        let spec = TransformSpec::new().with_offset("+2");

        let err = transform_read(&tv(Scalar::Uint32(3)), &spec).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Parse {
                step: Step::Offset,
                value_type: ValueType::Uint32,
                ..
            }
        ));

        let read = transform_read(&tv(Scalar::Int16(3)), &spec).unwrap();
        assert_eq!(read.value, Scalar::Int16(5));
        let read = transform_read(&tv(Scalar::Float32(3.0)), &spec).unwrap();
        assert_eq!(read.value, Scalar::Float32(5.0));
    }

    #[test]
    fn test_failing_step_aborts_later_steps() {
        // scale fails before offset on the read path
        let spec = TransformSpec::new().with_scale("1.5").with_offset("1");
        assert!(transform_read(&tv(Scalar::Int32(2)), &spec).is_err());
    }
}
