use anyhow::Context;
use nalgebra::DVector;

use crate::curve::{ControlPoints, NurbsCurve};
use crate::error::NurbsError;
use crate::misc::{real, FloatingPoint, Plane};

/// An ellipse centered at the plane origin with radii along the plane x and y axes
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ellipse<T: FloatingPoint> {
    plane: Plane<T>,
    radius_x: T,
    radius_y: T,
}

impl<T: FloatingPoint> Ellipse<T> {
    pub fn new(plane: Plane<T>, radius_x: T, radius_y: T) -> Self {
        Self {
            plane,
            radius_x,
            radius_y,
        }
    }

    /// A circle on the plane
    pub fn circle(plane: Plane<T>, radius: T) -> Self {
        Self::new(plane, radius, radius)
    }

    pub fn plane(&self) -> &Plane<T> {
        &self.plane
    }

    pub fn radius_x(&self) -> T {
        self.radius_x
    }

    pub fn radius_y(&self) -> T {
        self.radius_y
    }

    /// Exact rational form of degree 2 with 9 control points on the domain `[0, 2π]`
    ///
    /// The parameter of the result is not the angle except at multiples of π/2.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use approx::assert_relative_eq;
    ///
    /// let ellipse = Ellipse::new(Plane::world_xy(), 2., 1.);
    /// let curve = ellipse.try_nurbs_form().unwrap();
    /// assert_eq!(curve.cv_count(), 9);
    /// let (_, end) = curve.domain();
    /// assert_relative_eq!(end, std::f64::consts::TAU);
    /// let p = curve.point_at(std::f64::consts::FRAC_PI_2);
    /// assert_relative_eq!(p[1], 1., epsilon = 1e-12);
    /// ```
    pub fn try_nurbs_form(&self) -> anyhow::Result<NurbsCurve<T>> {
        let valid = |r: T| r > T::zero() && r.to_f64().is_some_and(f64::is_finite);
        if !valid(self.radius_x) || !valid(self.radius_y) {
            return Err(NurbsError::InvalidShape(format!(
                "ellipse radii {} and {} must be positive",
                self.radius_x, self.radius_y
            )))
            .context("ellipse nurbs form");
        }

        let w = real::<T>(std::f64::consts::FRAC_1_SQRT_2);
        let corners: [(f64, f64); 9] = [
            (1., 0.),
            (1., 1.),
            (0., 1.),
            (-1., 1.),
            (-1., 0.),
            (-1., -1.),
            (0., -1.),
            (1., -1.),
            (1., 0.),
        ];
        let points = corners
            .iter()
            .enumerate()
            .map(|(i, (x, y))| {
                let p = self
                    .plane
                    .point_at(real::<T>(*x) * self.radius_x, real::<T>(*y) * self.radius_y);
                let weight = if i % 2 == 0 { T::one() } else { w };
                DVector::from_vec(vec![p.x * weight, p.y * weight, p.z * weight, weight])
            })
            .collect();

        let quarter = real::<T>(std::f64::consts::FRAC_PI_2);
        let knots = [0., 0., 1., 1., 2., 2., 3., 3., 4., 4.]
            .iter()
            .map(|k| real::<T>(*k) * quarter)
            .collect();

        NurbsCurve::try_new(3, 3, ControlPoints::Homogeneous(points), knots)
            .context("ellipse nurbs form")
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    use crate::prelude::*;

    #[test]
    fn nurbs_form_lies_on_ellipse() {
        let plane = Plane::try_new(
            Point3::new(1., 2., 3.),
            Vector3::new(1., 1., 0.),
            Vector3::new(0., 0., 1.),
        )
        .unwrap();
        let ellipse = Ellipse::new(plane.clone(), 3., 1.5);
        let curve = ellipse.try_nurbs_form().unwrap();
        assert!(curve.is_rational());
        assert_eq!(curve.knot_style(), KnotStyle::PiecewiseBezier);
        for i in 0..=64 {
            let t = std::f64::consts::TAU * i as f64 / 64.;
            let p = curve.point_at(t);
            let v = Point3::new(p[0], p[1], p[2]) - plane.origin();
            let (x, y) = (v.dot(plane.x_axis()), v.dot(plane.y_axis()));
            assert_relative_eq!(v.dot(plane.normal()), 0., epsilon = 1e-12);
            assert_relative_eq!((x / 3.).powi(2) + (y / 1.5).powi(2), 1., epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_degenerate_radius() {
        let ellipse = Ellipse::new(Plane::world_xy(), 1., 0.);
        let err = ellipse.try_nurbs_form().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NurbsError>(),
            Some(NurbsError::InvalidShape(_))
        ));
    }
}
