use itertools::Itertools;

use crate::misc::{real, FloatingPoint};

use super::{CurveEnd, KnotVector};

/// Classification of a knot vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnotStyle {
    /// Not clamped, every knot spaced by the same delta
    Uniform,
    /// Clamped at both ends with uniformly spaced interior knots
    QuasiUniform,
    /// Clamped at both ends with every interior knot of full multiplicity
    PiecewiseBezier,
    /// Clamped at both ends, arbitrary interior
    ClampedEnd,
    NonUniform,
    /// The knot vector does not describe a valid domain
    Unknown,
}

impl KnotStyle {
    /// Classify a compact knot vector for a curve of the given order
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// let knots: KnotVector<f64> = KnotVector::clamped_uniform(4, 6, 1.);
    /// assert_eq!(KnotStyle::classify(&knots, 4), KnotStyle::QuasiUniform);
    /// let knots: KnotVector<f64> = KnotVector::periodic_uniform(4, 6, 1.);
    /// assert_eq!(KnotStyle::classify(&knots, 4), KnotStyle::Uniform);
    /// ```
    pub fn classify<T: FloatingPoint>(knots: &KnotVector<T>, order: usize) -> Self {
        if order < 2 || knots.len() < 2 * (order - 1) || !knots.is_non_decreasing() {
            return KnotStyle::Unknown;
        }
        let cv_count = knots.len() + 2 - order;
        let (start, end) = knots.domain(order);
        if start >= end {
            return KnotStyle::Unknown;
        }

        let k = knots.as_slice();
        let delta = (k[order - 1] - k[order - 2] + k[cv_count - 1] - k[cv_count - 2])
            * real::<T>(0.5);
        let tolerance = delta * real::<T>(1e-6);
        let is_uniform = |window: &[T]| {
            window
                .iter()
                .tuple_windows()
                .all(|(a, b)| (*b - *a - delta).abs() <= tolerance)
        };

        let clamped =
            knots.is_clamped(order, CurveEnd::Start) && knots.is_clamped(order, CurveEnd::End);
        if !clamped {
            return if is_uniform(k) {
                KnotStyle::Uniform
            } else {
                KnotStyle::NonUniform
            };
        }

        // linear spans are bezier spans whatever the interior spacing
        if cv_count == order || order == 2 {
            return KnotStyle::PiecewiseBezier;
        }

        if is_uniform(&k[(order - 2)..cv_count]) {
            return KnotStyle::QuasiUniform;
        }

        let interior = &k[(order - 1)..(cv_count - 1)];
        let full = interior
            .iter()
            .dedup_with_count()
            .all(|(count, _)| count == order - 1);
        if full {
            KnotStyle::PiecewiseBezier
        } else {
            KnotStyle::ClampedEnd
        }
    }
}
