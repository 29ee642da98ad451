use nalgebra::{convert, RealField};
use num_traits::ToPrimitive;

/// Trait for floating point types (f32, f64)
/// Mainly used to identify the type of the field in nalgebra
pub trait FloatingPoint: RealField + ToPrimitive + Copy {}

impl FloatingPoint for f32 {}
impl FloatingPoint for f64 {}

/// Absolute tolerance under which two coordinates or knots are treated as equal
pub const ZERO_TOLERANCE: f64 = 2.328_306_436_538_696_3e-10;

/// The highest polynomial degree a curve is allowed to have
pub const MAX_NURBS_DEGREE: usize = 11;

/// Convert an `f64` constant into the scalar type
pub fn real<T: FloatingPoint>(value: f64) -> T {
    convert(value)
}

/// Check if a weight can be stored in a rational control point
pub fn is_valid_weight<T: FloatingPoint>(weight: T) -> bool {
    weight > T::zero() && weight.to_f64().is_some_and(f64::is_finite)
}
