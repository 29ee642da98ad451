use nalgebra::DVector;

use crate::knot::KnotVector;
use crate::misc::FloatingPoint;

use super::{dehomogenize, ControlPoints, NurbsCurve};

/// A single polynomial or rational span in Bezier form, parameterized on `[0, 1]`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BezierCurve<T: FloatingPoint> {
    dimension: usize,
    control_points: ControlPoints<T>,
}

impl<T: FloatingPoint> BezierCurve<T> {
    pub(crate) fn new(dimension: usize, control_points: ControlPoints<T>) -> Self {
        Self {
            dimension,
            control_points,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of control points
    pub fn order(&self) -> usize {
        self.control_points.len()
    }

    pub fn degree(&self) -> usize {
        self.order() - 1
    }

    pub fn is_rational(&self) -> bool {
        self.control_points.is_rational()
    }

    pub fn control_points(&self) -> &ControlPoints<T> {
        &self.control_points
    }

    /// Evaluate by de Casteljau's algorithm
    pub fn point_at(&self, t: T) -> DVector<T> {
        let mut points = self.control_points.raw().to_vec();
        let n = points.len();
        for r in 1..n {
            for i in 0..(n - r) {
                points[i] = &points[i] * (T::one() - t) + &points[i + 1] * t;
            }
        }
        if self.is_rational() {
            dehomogenize(&points[0])
        } else {
            points.swap_remove(0)
        }
    }

    /// The same span as a clamped curve on `[0, 1]`
    pub fn to_nurbs(&self) -> NurbsCurve<T> {
        let order = self.order();
        NurbsCurve::new_unchecked(
            self.dimension,
            order,
            self.control_points.clone(),
            KnotVector::clamped_uniform(order, order, T::one()),
        )
    }
}
