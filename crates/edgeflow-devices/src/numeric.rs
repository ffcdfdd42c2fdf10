//! Per-type arithmetic used by the transform engine.
//!
//! Every numeric [`Scalar`] variant maps to a Rust primitive implementing
//! [`Numeric`]. Integer operations wrap at the type's native width; float
//! operations follow IEEE 754.

use std::fmt::Display;
use std::str::FromStr;

use edgeflow_core::ValueType;

use crate::value::Scalar;

pub(crate) trait Numeric: Copy + PartialEq + Display + FromStr {
    const VALUE_TYPE: ValueType;

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    /// `None` on integer division by zero.
    fn div(self, rhs: Self) -> Option<Self>;
    fn is_zero(self) -> bool;
    fn to_f64(self) -> f64;
    /// Truncates toward zero and saturates at the type bounds; NaN becomes 0.
    fn from_f64(v: f64) -> Self;
    fn into_scalar(self) -> Scalar;
}

macro_rules! impl_integer {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Numeric for $t {
                const VALUE_TYPE: ValueType = ValueType::$variant;

                fn add(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }
                fn sub(self, rhs: Self) -> Self {
                    self.wrapping_sub(rhs)
                }
                fn mul(self, rhs: Self) -> Self {
                    self.wrapping_mul(rhs)
                }
                fn div(self, rhs: Self) -> Option<Self> {
                    if rhs == 0 {
                        None
                    } else {
                        Some(self.wrapping_div(rhs))
                    }
                }
                fn is_zero(self) -> bool {
                    self == 0
                }
                fn to_f64(self) -> f64 {
                    self as f64
                }
                fn from_f64(v: f64) -> Self {
                    v as $t
                }
                fn into_scalar(self) -> Scalar {
                    Scalar::$variant(self)
                }
            }
        )*
    };
}

macro_rules! impl_float {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Numeric for $t {
                const VALUE_TYPE: ValueType = ValueType::$variant;

                fn add(self, rhs: Self) -> Self {
                    self + rhs
                }
                fn sub(self, rhs: Self) -> Self {
                    self - rhs
                }
                fn mul(self, rhs: Self) -> Self {
                    self * rhs
                }
                fn div(self, rhs: Self) -> Option<Self> {
                    Some(self / rhs)
                }
                fn is_zero(self) -> bool {
                    self == 0.0
                }
                fn to_f64(self) -> f64 {
                    self as f64
                }
                fn from_f64(v: f64) -> Self {
                    v as $t
                }
                fn into_scalar(self) -> Scalar {
                    Scalar::$variant(self)
                }
            }
        )*
    };
}

impl_integer!(
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
);

impl_float!(f32 => Float32, f64 => Float64);
