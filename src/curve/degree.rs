use crate::error::NurbsError;
use crate::misc::{FloatingPoint, MAX_NURBS_DEGREE};

use super::helper::elevate_degree;
use super::NurbsCurve;

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Raise the order of the curve without changing its shape
    /// The ends are clamped first.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![dvector![0., 0.], dvector![1., 2.], dvector![3., 2.], dvector![4., 0.]];
    /// let mut curve = NurbsCurve::try_clamped_uniform(2, 3, &points, 1.).unwrap();
    /// let before = curve.point_at(1.3);
    /// curve.try_increase_degree(5).unwrap();
    /// assert_eq!(curve.degree(), 4);
    /// assert_relative_eq!(curve.point_at(1.3), before, epsilon = 1e-10);
    /// ```
    pub fn try_increase_degree(&mut self, order: usize) -> Result<(), NurbsError> {
        if order < self.order() || order > MAX_NURBS_DEGREE + 1 {
            return Err(NurbsError::InvalidShape(format!(
                "cannot change order {} to {}",
                self.order(),
                order
            )));
        }
        if order == self.order() {
            return Ok(());
        }
        self.validate()?;
        self.clamp()?;

        let inc = order - self.order();
        let knots = self.padded_knots();
        let (knots, points) =
            elevate_degree(self.degree(), knots.as_slice(), self.control_points().raw(), inc);
        self.replace_padded(&knots, points);
        self.set_order(order);

        log::debug!("raised curve degree to {}", order - 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use crate::prelude::*;

    #[test]
    fn elevate_rational_curve() {
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let mut curve = NurbsCurve::try_new(
            2,
            3,
            ControlPoints::Homogeneous(vec![
                dvector![1., 0., 1.],
                dvector![w, w, w],
                dvector![0., 1., 1.],
                dvector![-w, w, w],
                dvector![-1., 0., 1.],
            ]),
            vec![0., 0., 1., 1., 2., 2.],
        )
        .unwrap();
        let original = curve.clone();
        curve.try_increase_degree(4).unwrap();
        assert!(curve.is_valid());
        assert_eq!(curve.order(), 4);
        assert_eq!(curve.cv_count(), 7);
        assert_eq!(curve.knots().to_vec(), vec![0., 0., 0., 1., 1., 1., 2., 2., 2.]);
        for i in 0..=16 {
            let t = i as f64 / 8.;
            let p = curve.point_at(t);
            assert_relative_eq!(p.norm(), 1., epsilon = 1e-12);
            assert_relative_eq!(p, original.point_at(t), epsilon = 1e-12);
        }
    }

    #[test]
    fn elevate_unclamped_curve() {
        let points = vec![
            dvector![0., 0., 0.],
            dvector![1., 2., 1.],
            dvector![3., 3., -1.],
            dvector![5., 1., 0.],
            dvector![6., -1., 2.],
        ];
        let original = NurbsCurve::try_periodic_uniform(3, 4, &points, 0.5).unwrap();
        let mut curve = original.clone();
        curve.try_increase_degree(6).unwrap();
        assert!(curve.is_clamped(CurveEnd::Start) && curve.is_clamped(CurveEnd::End));
        assert_eq!(curve.domain(), original.domain());
        let (t0, t1) = original.domain();
        for i in 0..=20 {
            let t = t0 + (t1 - t0) * i as f64 / 20.;
            assert_relative_eq!(curve.point_at(t), original.point_at(t), epsilon = 1e-10);
        }
    }

    #[test]
    fn reject_lower_order() {
        let mut curve = NurbsCurve::<f64>::try_create(2, false, 4, 5).unwrap();
        assert!(matches!(
            curve.try_increase_degree(3),
            Err(NurbsError::InvalidShape(_))
        ));
        assert!(matches!(
            curve.try_increase_degree(13),
            Err(NurbsError::InvalidShape(_))
        ));
        assert!(curve.try_increase_degree(4).is_ok());
    }
}
