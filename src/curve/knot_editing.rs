use crate::error::NurbsError;
use crate::knot::{CurveEnd, KnotVector};
use crate::misc::{FloatingPoint, Invertible};

use super::helper::{insert_knot, remove_knot};
use super::nurbs_curve::check_knot_delta;
use super::NurbsCurve;

impl<T: FloatingPoint> NurbsCurve<T> {
    pub fn knot(&self, index: usize) -> Result<T, NurbsError> {
        NurbsError::check_index(index, self.knot_count())?;
        Ok(self.knots()[index])
    }

    /// Set a single knot
    /// Fails without modification when the value would break the non-decreasing order.
    pub fn set_knot(&mut self, index: usize, value: T) -> Result<(), NurbsError> {
        NurbsError::check_index(index, self.knot_count())?;
        let knots = self.knots();
        let below = index > 0 && value < knots[index - 1];
        let above = index + 1 < knots.len() && value > knots[index + 1];
        if below || above || !value.to_f64().is_some_and(f64::is_finite) {
            return Err(NurbsError::OutOfDomain(format!(
                "knot {} at index {} breaks the knot order",
                value, index
            )));
        }
        self.knots_mut().as_mut_slice()[index] = value;
        Ok(())
    }

    /// Size of the run of equal knots containing the knot at `index`
    pub fn knot_multiplicity(&self, index: usize) -> Result<usize, NurbsError> {
        NurbsError::check_index(index, self.knot_count())?;
        Ok(self.knots().multiplicity_at(index))
    }

    /// The knot value omitted from the compact knot vector at the given end
    pub fn superfluous_knot(&self, end: CurveEnd) -> T {
        self.knots().superfluous(self.order(), end)
    }

    /// Check if the end knot has full multiplicity
    pub fn is_clamped(&self, end: CurveEnd) -> bool {
        self.knots().is_clamped(self.order(), end)
    }

    /// Replace the knot vector by a uniform one spaced by `delta`
    /// Clamped knots repeat the end values `order - 1` times, otherwise every knot is equally spaced.
    /// The control points are kept.
    pub fn try_make_uniform_knot_vector(&mut self, delta: T, clamped: bool) -> Result<(), NurbsError> {
        check_knot_delta(delta)?;
        let knots = if clamped {
            KnotVector::clamped_uniform(self.order(), self.cv_count(), delta)
        } else {
            KnotVector::periodic_uniform(self.order(), self.cv_count(), delta)
        };
        *self.knots_mut() = knots;
        Ok(())
    }

    /// Insert a knot `multiplicity` times without changing the shape of the curve
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![dvector![0., 0.], dvector![1., 2.], dvector![3., 2.], dvector![4., 0.]];
    /// let mut curve = NurbsCurve::try_clamped_uniform(2, 3, &points, 1.).unwrap();
    /// let before = curve.point_at(0.7);
    /// curve.try_insert_knot(0.5, 2).unwrap();
    /// assert_eq!(curve.cv_count(), 6);
    /// assert_relative_eq!(curve.point_at(0.7), before, epsilon = 1e-10);
    /// ```
    pub fn try_insert_knot(&mut self, value: T, multiplicity: usize) -> Result<(), NurbsError> {
        if multiplicity == 0 {
            return Err(NurbsError::InvalidShape(
                "knot multiplicity must be positive".to_string(),
            ));
        }
        let (t0, t1) = self.domain();
        if !(t0 <= value && value <= t1) {
            return Err(NurbsError::OutOfDomain(format!(
                "knot {} is outside the domain [{}, {}]",
                value, t0, t1
            )));
        }
        let existing = self.knots().count(value);
        if existing + multiplicity > self.degree() {
            return Err(NurbsError::InvalidShape(format!(
                "knot {} would have multiplicity {} above the degree {}",
                value,
                existing + multiplicity,
                self.degree()
            )));
        }

        // a knot at an open end would leave an empty end span
        if (value == t0 && !self.is_clamped(CurveEnd::Start))
            || (value == t1 && !self.is_clamped(CurveEnd::End))
        {
            return Err(NurbsError::OutOfDomain(format!(
                "knot {} lies on an unclamped end of the domain [{}, {}]",
                value, t0, t1
            )));
        }

        self.insert_knot_unchecked(value, multiplicity);

        log::debug!("inserted knot {} {} times", value, multiplicity);
        Ok(())
    }

    fn insert_knot_unchecked(&mut self, value: T, multiplicity: usize) {
        let knots = self.padded_knots();
        let (knots, points) = insert_knot(
            self.degree(),
            knots.as_slice(),
            self.control_points().raw(),
            value,
            multiplicity,
        );
        self.replace_padded(&knots, points);
    }

    /// Remove the interior knots `index0..index1`
    /// The affected control points are recomputed from both sides of each removed knot,
    /// so the shape is kept only approximately unless the knots are removable.
    pub fn try_remove_knots(&mut self, index0: usize, index1: usize) -> Result<(), NurbsError> {
        let cv_count = self.cv_count();
        if index0 < self.order() - 1 {
            return Err(NurbsError::InvalidIndex {
                index: index0,
                len: self.knot_count(),
            });
        }
        if index1 <= index0 || index1 > cv_count - 1 {
            return Err(NurbsError::InvalidIndex {
                index: index1,
                len: cv_count,
            });
        }
        self.validate()?;

        let (t0, t1) = self.domain();
        let compact = self.knots().as_slice();
        if compact[index0..index1].iter().any(|k| *k <= t0 || *k >= t1) {
            return Err(NurbsError::OutOfDomain(
                "only knots inside the domain can be removed".to_string(),
            ));
        }

        let degree = self.degree();
        let mut knots = self.padded_knots().to_vec();
        let mut points = self.control_points().raw().to_vec();
        for index in (index0..index1).rev() {
            let value = knots[index + 1];
            let r = knots.iter().rposition(|k| *k == value).unwrap_or(index + 1);
            (knots, points) = remove_knot(degree, &knots, &points, r);
        }
        self.replace_padded(&knots, points);

        log::debug!("removed knots {}..{}", index0, index1);
        Ok(())
    }

    /// Give the end knot full multiplicity without changing the shape of the curve
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![dvector![1., 0.], dvector![0., 1.], dvector![-1., 0.], dvector![0., -1.]];
    /// let mut curve = NurbsCurve::try_periodic_uniform(2, 3, &points, 1.).unwrap();
    /// let (start, _) = curve.domain();
    /// let head = curve.point_at(start);
    /// curve.try_clamp_end(CurveEnd::Start).unwrap();
    /// assert!(curve.is_clamped(CurveEnd::Start));
    /// assert_relative_eq!(curve.control_points().euclidean(0), head, epsilon = 1e-12);
    /// ```
    pub fn try_clamp_end(&mut self, end: CurveEnd) -> Result<(), NurbsError> {
        match end {
            CurveEnd::Start => self.clamp_start(),
            CurveEnd::End => {
                self.invert();
                self.clamp_start();
                self.invert();
            }
        }
        Ok(())
    }

    /// Clamp both ends
    pub(crate) fn clamp(&mut self) -> Result<(), NurbsError> {
        self.try_clamp_end(CurveEnd::Start)?;
        self.try_clamp_end(CurveEnd::End)
    }

    fn clamp_start(&mut self) {
        if self.is_clamped(CurveEnd::Start) {
            return;
        }
        let degree = self.degree();
        let (t0, _) = self.domain();
        let times = degree.saturating_sub(self.knots().count(t0));

        let padded = self.padded_knots();
        let (knots, points) = insert_knot(
            degree,
            padded.as_slice(),
            self.control_points().raw(),
            t0,
            times,
        );

        // drop the knots and control points that only shape the curve before t0
        let g = knots.iter().position(|k| *k == t0).unwrap_or(1).max(1);
        let compact = knots[g..(knots.len() - 1)].to_vec();
        let points = points[(g - 1)..].to_vec();
        let control_points = self.control_points().with_raw(points);
        *self.knots_mut() = KnotVector::new(compact);
        *self.control_points_mut() = control_points;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use crate::prelude::*;

    fn sample() -> NurbsCurve<f64> {
        let points = vec![
            dvector![0., 0.],
            dvector![1., 2.],
            dvector![3., 3.],
            dvector![5., 1.],
            dvector![6., -1.],
        ];
        NurbsCurve::try_clamped_uniform(2, 4, &points, 1.).unwrap()
    }

    #[test]
    fn set_knot_keeps_order() {
        let mut curve = sample();
        assert_eq!(curve.knots().to_vec(), vec![0., 0., 0., 1., 2., 2., 2.]);
        assert!(matches!(
            curve.set_knot(3, 2.5),
            Err(NurbsError::OutOfDomain(_))
        ));
        assert!(matches!(
            curve.set_knot(7, 1.),
            Err(NurbsError::InvalidIndex { index: 7, len: 7 })
        ));
        curve.set_knot(3, 1.5).unwrap();
        assert_eq!(curve.knot(3).unwrap(), 1.5);
    }

    #[test]
    fn insert_at_domain_ends() {
        let mut curve = sample();
        assert!(matches!(
            curve.try_insert_knot(2., 1),
            Err(NurbsError::InvalidShape(_))
        ));
        assert!(matches!(
            curve.try_insert_knot(2.5, 1),
            Err(NurbsError::OutOfDomain(_))
        ));
        assert!(matches!(
            curve.try_insert_knot(1., 3),
            Err(NurbsError::InvalidShape(_))
        ));

        let mut periodic = NurbsCurve::try_periodic_uniform(
            2,
            3,
            &[dvector![1., 0.], dvector![0., 1.], dvector![-1., 0.]],
            1.,
        )
        .unwrap();
        let original = periodic.clone();
        let (t0, t1) = periodic.domain();
        assert!(matches!(
            periodic.try_insert_knot(t0, 1),
            Err(NurbsError::OutOfDomain(_))
        ));
        assert!(matches!(
            periodic.try_insert_knot(t1, 1),
            Err(NurbsError::OutOfDomain(_))
        ));
        assert_eq!(periodic, original);
        assert!(periodic.is_valid());

        periodic.try_insert_knot(t1 - 0.5, 1).unwrap();
        assert!(periodic.is_valid());
        assert_eq!(periodic.knot_count(), periodic.cv_count() + 1);
        assert_eq!(periodic.domain(), original.domain());
        for t in [t0, t1, t1 - 0.3, t1 - 1.7] {
            assert_relative_eq!(periodic.point_at(t), original.point_at(t), epsilon = 1e-12);
        }
    }

    #[test]
    fn remove_restores_inserted_knot() {
        let mut curve = sample();
        let original = curve.clone();
        curve.try_insert_knot(0.5, 1).unwrap();
        assert_eq!(curve.knot_multiplicity(3).unwrap(), 1);
        curve.try_remove_knots(3, 4).unwrap();
        assert!(curve.is_duplicate(&original, false, 1e-10));
    }

    #[test]
    fn remove_rejects_end_knots() {
        let mut curve = sample();
        assert!(matches!(
            curve.try_remove_knots(2, 3),
            Err(NurbsError::InvalidIndex { .. })
        ));
        assert!(matches!(
            curve.try_remove_knots(3, 5),
            Err(NurbsError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn clamp_both_ends() {
        let points = vec![
            dvector![1., 0.],
            dvector![0., 1.],
            dvector![-1., 0.],
            dvector![0., -1.],
        ];
        let periodic = NurbsCurve::try_periodic_uniform(2, 4, &points, 1.).unwrap();
        let mut clamped = periodic.clone();
        clamped.try_clamp_end(CurveEnd::Start).unwrap();
        clamped.try_clamp_end(CurveEnd::End).unwrap();
        assert!(clamped.is_clamped(CurveEnd::Start));
        assert!(clamped.is_clamped(CurveEnd::End));
        assert_eq!(clamped.cv_count(), periodic.cv_count());
        assert_eq!(clamped.domain(), periodic.domain());
        let (t0, t1) = periodic.domain();
        for i in 0..=10 {
            let t = t0 + (t1 - t0) * i as f64 / 10.;
            assert_relative_eq!(clamped.point_at(t), periodic.point_at(t), epsilon = 1e-10);
        }
    }

    #[test]
    fn uniform_knot_vectors() {
        let mut curve = sample();
        curve.try_make_uniform_knot_vector(0.5, false).unwrap();
        assert_eq!(curve.knot_style(), KnotStyle::Uniform);
        assert_eq!(curve.superfluous_knot(CurveEnd::Start), -1.5);
        curve.try_make_uniform_knot_vector(1., true).unwrap();
        assert_eq!(curve.knot_style(), KnotStyle::QuasiUniform);
        assert_eq!(curve.superfluous_knot(CurveEnd::End), 2.);
        assert!(curve.try_make_uniform_knot_vector(0., true).is_err());
    }
}
