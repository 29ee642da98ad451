use itertools::Itertools;

use crate::error::NurbsError;
use crate::knot::{KnotStyle, KnotVector};
use crate::misc::{real, FloatingPoint};

use super::{BezierCurve, NurbsCurve};

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Check if every span is a bezier, i.e. the knots are clamped with full interior multiplicity
    pub fn has_bezier_spans(&self) -> bool {
        self.knot_style() == KnotStyle::PiecewiseBezier
    }

    /// Extract the span `[k[order - 2 + index], k[order - 1 + index]]` in bezier form
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![dvector![0., 0.], dvector![1., 2.], dvector![3., 2.], dvector![4., 0.]];
    /// let curve = NurbsCurve::try_clamped_uniform(2, 3, &points, 1.).unwrap();
    /// let bezier = curve.try_convert_span_to_bezier(1).unwrap();
    /// assert_eq!(bezier.order(), 3);
    /// assert_relative_eq!(bezier.point_at(0.5), curve.point_at(1.5), epsilon = 1e-12);
    /// ```
    pub fn try_convert_span_to_bezier(&self, index: usize) -> Result<BezierCurve<T>, NurbsError> {
        let order = self.order();
        NurbsError::check_index(index, self.cv_count() - order + 1)?;

        let knots = self.knots();
        let (a, b) = (knots[order - 2 + index], knots[order - 1 + index]);
        if a >= b {
            return Err(NurbsError::OutOfDomain(format!(
                "span {} is empty at {}",
                index, a
            )));
        }

        let points = self.control_points().raw()[index..(index + order)].to_vec();
        let span_knots = knots.as_slice()[index..(index + 2 * (order - 1))].to_vec();
        let mut span = NurbsCurve::new_unchecked(
            self.dimension(),
            order,
            self.control_points().with_raw(points),
            KnotVector::new(span_knots),
        );
        span.clamp()?;

        Ok(BezierCurve::new(
            self.dimension(),
            span.control_points().clone(),
        ))
    }

    /// Split the curve into bezier spans by raising every interior knot to full multiplicity
    ///
    /// With `set_end_weights_to_one`, each rational span is reparameterized
    /// so that the weights at its ends are 1.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    ///
    /// let points = vec![dvector![0., 0.], dvector![1., 2.], dvector![3., 2.], dvector![4., 0.]];
    /// let mut curve = NurbsCurve::try_clamped_uniform(2, 3, &points, 1.).unwrap();
    /// curve.try_make_piecewise_bezier(false).unwrap();
    /// assert!(curve.has_bezier_spans());
    /// assert_eq!(curve.knots().to_vec(), vec![0., 0., 1., 1., 2., 2.]);
    /// ```
    pub fn try_make_piecewise_bezier(&mut self, set_end_weights_to_one: bool) -> Result<(), NurbsError> {
        self.validate()?;
        self.clamp()?;

        let degree = self.degree();
        let (t0, t1) = self.domain();
        let interior = self
            .knots()
            .iter()
            .filter(|k| **k > t0 && **k < t1)
            .dedup_with_count()
            .map(|(count, k)| (count, *k))
            .collect_vec();
        for (count, k) in interior {
            if count < degree {
                self.try_insert_knot(k, degree - count)?;
            }
        }

        if set_end_weights_to_one && self.is_rational() {
            let degree_inv = T::one() / real::<T>(degree as f64);
            let weights = self.weights();
            let points = self.control_points_mut().raw_mut();
            points[0] /= weights[0];
            // a shared corner is scaled once, by the segment on its left
            for start in (0..(weights.len() - 1)).step_by(degree) {
                let (w0, wp) = (weights[start], weights[start + degree]);
                let c = (wp / w0).powf(degree_inv);
                let mut factor = T::one() / w0;
                for p in points[(start + 1)..=(start + degree)].iter_mut() {
                    factor /= c;
                    *p *= factor;
                }
            }
        }

        Ok(())
    }
}
