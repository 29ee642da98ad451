use crate::error::NurbsError;
use crate::knot::KnotVector;
use crate::misc::{real, FloatingPoint};

use super::NurbsCurve;

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Join `other` to the end of this curve
    ///
    /// The lower order is raised, rationality is matched and both curves are clamped.
    /// The domain of `other` is shifted to start where this curve ends and
    /// the two touching control points are replaced by their average.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let a = NurbsCurve::try_clamped_uniform(2, 2, &[dvector![0., 0.], dvector![1., 0.]], 1.).unwrap();
    /// let b = NurbsCurve::try_clamped_uniform(
    ///     2,
    ///     3,
    ///     &[dvector![1., 0.], dvector![2., 1.], dvector![3., 0.]],
    ///     1.,
    /// )
    /// .unwrap();
    /// let mut joined = a.clone();
    /// joined.try_append(&b).unwrap();
    /// assert_eq!(joined.order(), 3);
    /// assert_eq!(joined.domain(), (0., 2.));
    /// assert_relative_eq!(joined.point_at(1.5), b.point_at(0.5), epsilon = 1e-12);
    /// ```
    pub fn try_append(&mut self, other: &Self) -> Result<(), NurbsError> {
        if self.dimension() != other.dimension() {
            return Err(NurbsError::InvalidShape(format!(
                "cannot append a curve of dimension {} to one of dimension {}",
                other.dimension(),
                self.dimension()
            )));
        }
        self.validate()?;
        other.validate()?;

        let mut head = self.clone();
        let mut tail = other.clone();

        let order = head.order().max(tail.order());
        head.try_increase_degree(order)?;
        tail.try_increase_degree(order)?;
        if head.is_rational() || tail.is_rational() {
            head.make_rational();
            tail.make_rational();
        }
        head.clamp()?;
        tail.clamp()?;

        if tail.is_rational() {
            let last = head.control_points().weight(head.cv_count() - 1);
            let first = tail.control_points().weight(0);
            let scale = last / first;
            tail.control_points_mut()
                .raw_mut()
                .iter_mut()
                .for_each(|p| *p *= scale);
        }

        let (_, end) = head.domain();
        let (t0, t1) = tail.domain();
        tail.knots_mut().remap((t0, t1), (end, end + t1 - t0));

        let degree = order - 1;
        let knots: Vec<T> = head
            .knots()
            .iter()
            .chain(tail.knots().iter().skip(degree))
            .copied()
            .collect();

        let mut points = head.control_points().raw().to_vec();
        let tail_points = tail.control_points().raw();
        if let Some(junction) = points.last_mut() {
            *junction = (&*junction + &tail_points[0]) * real::<T>(0.5);
        }
        points.extend(tail_points.iter().skip(1).cloned());

        *self = NurbsCurve::new_unchecked(
            head.dimension(),
            order,
            head.control_points().with_raw(points),
            KnotVector::new(knots),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use crate::prelude::*;

    #[test]
    fn append_rational_arc_to_polyline() {
        let line = NurbsCurve::try_clamped_uniform(
            2,
            2,
            &[dvector![-1., -1.], dvector![-1., 0.]],
            2.,
        )
        .unwrap();
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let arc = NurbsCurve::try_new(
            2,
            3,
            ControlPoints::Homogeneous(vec![
                dvector![-1., 0., 1.],
                dvector![-w, w, w],
                dvector![0., 1., 1.],
            ]),
            vec![5., 5., 6., 6.],
        )
        .unwrap();

        let mut curve = line.clone();
        curve.try_append(&arc).unwrap();
        assert!(curve.is_valid());
        assert!(curve.is_rational());
        assert_eq!(curve.order(), 3);
        assert_eq!(curve.domain(), (0., 3.));
        assert_eq!(curve.cv_count(), 5);

        assert_relative_eq!(curve.point_at(1.), line.point_at(1.), epsilon = 1e-12);
        for i in 0..=10 {
            let t = 2. + i as f64 / 10.;
            let p = curve.point_at(t);
            assert_relative_eq!(p.norm(), 1., epsilon = 1e-12);
            assert_relative_eq!(p, arc.point_at(t + 3.), epsilon = 1e-12);
        }
    }

    #[test]
    fn append_averages_the_junction() {
        let a = NurbsCurve::try_clamped_uniform(2, 2, &[dvector![0., 0.], dvector![1., 0.]], 1.).unwrap();
        let b = NurbsCurve::try_clamped_uniform(2, 2, &[dvector![1., 1.], dvector![2., 1.]], 1.).unwrap();
        let mut joined = a.clone();
        joined.try_append(&b).unwrap();
        assert_eq!(joined.knots().to_vec(), vec![0., 1., 2.]);
        assert_relative_eq!(joined.cv(1).unwrap(), dvector![1., 0.5]);
    }

    #[test]
    fn append_rejects_dimension_mismatch() {
        let mut a = NurbsCurve::<f64>::try_create(2, false, 2, 2).unwrap();
        let b = NurbsCurve::<f64>::try_create(3, false, 2, 2).unwrap();
        let before = a.clone();
        assert!(matches!(a.try_append(&b), Err(NurbsError::InvalidShape(_))));
        assert_eq!(a, before);
    }
}
