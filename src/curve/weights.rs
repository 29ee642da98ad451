use nalgebra::DVector;

use crate::error::NurbsError;
use crate::misc::{is_valid_weight, real, FloatingPoint, ZERO_TOLERANCE};

use super::{homogenize, ControlPoints, NurbsCurve};

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Euclidean location of a control point
    pub fn cv(&self, index: usize) -> Result<DVector<T>, NurbsError> {
        NurbsError::check_index(index, self.cv_count())?;
        Ok(self.control_points().euclidean(index))
    }

    /// Move a control point to a euclidean location, keeping its weight
    pub fn set_cv(&mut self, index: usize, point: &DVector<T>) -> Result<(), NurbsError> {
        NurbsError::check_index(index, self.cv_count())?;
        self.check_length(point, self.dimension())?;
        let stored = match self.control_points() {
            ControlPoints::Cartesian(_) => point.clone(),
            ControlPoints::Homogeneous(_) => homogenize(point, self.control_points().weight(index)),
        };
        self.control_points_mut().raw_mut()[index] = stored;
        Ok(())
    }

    /// Homogeneous form `(w·x, …, w)` of a control point
    pub fn cv4(&self, index: usize) -> Result<DVector<T>, NurbsError> {
        NurbsError::check_index(index, self.cv_count())?;
        Ok(self.control_points().homogeneous(index))
    }

    /// Set a control point from its homogeneous form
    /// A weight other than 1 makes a non-rational curve rational.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    ///
    /// let mut curve = NurbsCurve::<f64>::try_create(2, false, 3, 3).unwrap();
    /// curve.set_cv4(1, &dvector![2., 2., 2.]).unwrap();
    /// assert!(curve.is_rational());
    /// assert_eq!(curve.cv(1).unwrap(), dvector![1., 1.]);
    /// assert!(curve.set_cv4(1, &dvector![1., 1., -1.]).is_err());
    /// ```
    pub fn set_cv4(&mut self, index: usize, point: &DVector<T>) -> Result<(), NurbsError> {
        NurbsError::check_index(index, self.cv_count())?;
        let dimension = self.dimension();
        self.check_length(point, dimension + 1)?;
        let w = point[dimension];
        check_weight(w)?;

        if !self.is_rational() && w != T::one() {
            self.make_rational();
        }
        let stored = match self.control_points() {
            ControlPoints::Cartesian(_) => point.rows(0, dimension).into_owned(),
            ControlPoints::Homogeneous(_) => point.clone(),
        };
        self.control_points_mut().raw_mut()[index] = stored;
        Ok(())
    }

    pub fn weight(&self, index: usize) -> Result<T, NurbsError> {
        NurbsError::check_index(index, self.cv_count())?;
        Ok(self.control_points().weight(index))
    }

    /// Change the weight of a control point, keeping its euclidean location
    /// A weight other than 1 makes a non-rational curve rational.
    pub fn set_weight(&mut self, index: usize, weight: T) -> Result<(), NurbsError> {
        NurbsError::check_index(index, self.cv_count())?;
        check_weight(weight)?;
        if !self.is_rational() {
            if weight == T::one() {
                return Ok(());
            }
            self.make_rational();
        }
        let location = self.control_points().euclidean(index);
        self.control_points_mut().raw_mut()[index] = homogenize(&location, weight);
        Ok(())
    }

    /// Store weights, all of them 1 for a non-rational curve
    pub fn make_rational(&mut self) {
        if !self.is_rational() {
            let points = std::mem::replace(self.control_points_mut(), ControlPoints::Cartesian(vec![]));
            *self.control_points_mut() = points.into_rational();
        }
    }

    /// Drop the weights
    /// Only possible when every weight is the same, otherwise the curve would change.
    pub fn try_make_non_rational(&mut self) -> Result<(), NurbsError> {
        let ControlPoints::Homogeneous(points) = self.control_points() else {
            return Ok(());
        };
        let weights = self.weights();
        let w0 = weights[0];
        let tolerance = real::<T>(ZERO_TOLERANCE) * w0;
        if weights.iter().any(|w| (*w - w0).abs() > tolerance) {
            return Err(NurbsError::OutOfDomain(
                "weights differ, the curve cannot be made non-rational".to_string(),
            ));
        }
        let dimension = self.dimension();
        let points = points
            .iter()
            .map(|p| p.rows(0, dimension) / p[dimension])
            .collect();
        *self.control_points_mut() = ControlPoints::Cartesian(points);
        Ok(())
    }

    /// Move every control point to the origin with unit weight
    pub fn zero_cvs(&mut self) {
        let rational = self.is_rational();
        let dimension = self.dimension();
        self.control_points_mut().raw_mut().iter_mut().for_each(|p| {
            p.fill(T::zero());
            if rational {
                p[dimension] = T::one();
            }
        });
    }

    /// Reparameterize by the linear fractional map `s = c·t / ((c - 1)·t + 1)`
    /// applied on the normalized domain.
    /// The domain and the image are kept, the ends are clamped and the curve becomes rational.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![dvector![0., 0.], dvector![1., 2.], dvector![3., 2.], dvector![4., 0.]];
    /// let curve = NurbsCurve::try_clamped_uniform(2, 3, &points, 1.).unwrap();
    /// let mut reparameterized = curve.clone();
    /// reparameterized.try_reparameterize(2.).unwrap();
    /// assert_eq!(reparameterized.domain(), curve.domain());
    /// // t = 0.5 on the domain [0, 2] is 0.25 normalized, which maps to 0.4
    /// assert_relative_eq!(reparameterized.point_at(0.8), curve.point_at(0.5), epsilon = 1e-12);
    /// ```
    pub fn try_reparameterize(&mut self, c: T) -> Result<(), NurbsError> {
        if !is_valid_weight(c) {
            return Err(NurbsError::OutOfDomain(format!(
                "reparameterization factor {} is not positive",
                c
            )));
        }
        if c == T::one() {
            return Ok(());
        }

        self.clamp()?;
        self.make_rational();

        let degree = self.degree();
        let (t0, t1) = self.domain();
        let d = t1 - t0;
        let c1 = c - T::one();
        let normalized: Vec<T> = self.knots().iter().map(|k| (*k - t0) / d).collect();

        let points = self.control_points_mut().raw_mut();
        for (i, p) in points.iter_mut().enumerate() {
            let factor = normalized[i..(i + degree)]
                .iter()
                .fold(T::one(), |acc, t| acc / (c1 * *t + T::one()));
            *p *= factor;
        }

        let knots = self.knots_mut().as_mut_slice();
        for (k, t) in knots.iter_mut().zip(normalized) {
            if *k != t0 && *k != t1 {
                *k = t0 + d * (c * t / (c1 * t + T::one()));
            }
        }
        Ok(())
    }

    /// Change the weights of the end control points by a projective reparameterization
    /// The image is kept, the ends are clamped and the curve becomes rational.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![dvector![0., 0.], dvector![1., 2.], dvector![3., 2.], dvector![4., 0.]];
    /// let mut curve = NurbsCurve::try_clamped_uniform(2, 3, &points, 1.).unwrap();
    /// curve.try_change_end_weights(2., 0.5).unwrap();
    /// assert_relative_eq!(curve.weight(0).unwrap(), 2.);
    /// assert_relative_eq!(curve.weight(3).unwrap(), 0.5, epsilon = 1e-12);
    /// assert_relative_eq!(curve.cv(3).unwrap(), points[3], epsilon = 1e-12);
    /// ```
    pub fn try_change_end_weights(&mut self, w0: T, w1: T) -> Result<(), NurbsError> {
        check_weight(w0)?;
        check_weight(w1)?;
        if !self.is_rational() && w0 == T::one() && w1 == T::one() {
            return Ok(());
        }

        self.clamp()?;
        self.make_rational();

        let last = self.cv_count() - 1;
        let v0 = self.control_points().weight(0);
        let v1 = self.control_points().weight(last);
        let degree = real::<T>(self.degree() as f64);
        let c = ((v1 * w0) / (v0 * w1)).powf(T::one() / degree);
        self.try_reparameterize(c)?;

        let scale = w0 / v0;
        self.control_points_mut()
            .raw_mut()
            .iter_mut()
            .for_each(|p| *p *= scale);
        Ok(())
    }

    pub(crate) fn check_length(&self, point: &DVector<T>, len: usize) -> Result<(), NurbsError> {
        if point.len() == len {
            Ok(())
        } else {
            Err(NurbsError::InvalidShape(format!(
                "point has {} coordinates, expected {}",
                point.len(),
                len
            )))
        }
    }
}

fn check_weight<T: FloatingPoint>(weight: T) -> Result<(), NurbsError> {
    if is_valid_weight(weight) {
        Ok(())
    } else {
        Err(NurbsError::OutOfDomain(format!(
            "weight {} is not positive and finite",
            weight
        )))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use crate::prelude::*;

    fn sample() -> NurbsCurve<f64> {
        let points = vec![
            dvector![0., 0., 0.],
            dvector![1., 2., 0.],
            dvector![3., 3., 1.],
            dvector![5., 1., 0.],
            dvector![6., -1., 2.],
        ];
        NurbsCurve::try_clamped_uniform(3, 4, &points, 1.).unwrap()
    }

    #[test]
    fn unit_weight_keeps_curve_non_rational() {
        let mut curve = sample();
        curve.set_weight(2, 1.).unwrap();
        assert!(!curve.is_rational());
        curve.set_cv4(2, &dvector![3., 3., 1., 1.]).unwrap();
        assert!(!curve.is_rational());
    }

    #[test]
    fn set_weight_keeps_location() {
        let mut curve = sample();
        curve.set_weight(2, 3.).unwrap();
        assert!(curve.is_rational());
        assert_eq!(curve.weight(2).unwrap(), 3.);
        assert_relative_eq!(curve.cv(2).unwrap(), dvector![3., 3., 1.], epsilon = 1e-14);
        assert_eq!(curve.cv4(2).unwrap(), dvector![9., 9., 3., 3.]);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let mut curve = sample();
        let before = curve.clone();
        for w in [0., -1., f64::NAN, f64::INFINITY] {
            assert!(matches!(
                curve.set_weight(1, w),
                Err(NurbsError::OutOfDomain(_))
            ));
            assert!(curve.set_cv4(1, &dvector![1., 2., 0., w]).is_err());
        }
        assert_eq!(curve, before);
    }

    #[test]
    fn set_cv_keeps_weight() {
        let mut curve = sample();
        curve.set_weight(1, 2.).unwrap();
        curve.set_cv(1, &dvector![-1., -1., -1.]).unwrap();
        assert_eq!(curve.weight(1).unwrap(), 2.);
        assert_eq!(curve.cv(1).unwrap(), dvector![-1., -1., -1.]);
        assert!(matches!(
            curve.set_cv(1, &dvector![1., 1.]),
            Err(NurbsError::InvalidShape(_))
        ));
    }

    #[test]
    fn make_non_rational_requires_equal_weights() {
        let mut curve = sample();
        curve.make_rational();
        assert!(curve.is_rational());
        for i in 0..curve.cv_count() {
            curve.set_weight(i, 2.).unwrap();
        }
        let reference = curve.point_at(0.7);
        curve.try_make_non_rational().unwrap();
        assert!(!curve.is_rational());
        assert_relative_eq!(curve.point_at(0.7), reference, epsilon = 1e-12);

        curve.set_weight(0, 0.5).unwrap();
        let before = curve.clone();
        assert!(matches!(
            curve.try_make_non_rational(),
            Err(NurbsError::OutOfDomain(_))
        ));
        assert_eq!(curve, before);
    }

    #[test]
    fn zero_cvs_resets_weights() {
        let mut curve = sample();
        curve.set_weight(3, 4.).unwrap();
        curve.zero_cvs();
        assert!(curve.is_rational());
        for i in 0..curve.cv_count() {
            assert_eq!(curve.cv4(i).unwrap(), dvector![0., 0., 0., 1.]);
        }
    }

    #[test]
    fn reparameterize_keeps_image() {
        let mut curve = sample();
        curve.set_weight(2, 2.5).unwrap();
        let original = curve.clone();
        let c = 0.4;
        curve.try_reparameterize(c).unwrap();
        assert_eq!(curve.domain(), original.domain());
        let (t0, t1) = original.domain();
        for i in 0..=20 {
            let t = t0 + (t1 - t0) * i as f64 / 20.;
            let u = (t - t0) / (t1 - t0);
            let s = t0 + (t1 - t0) * c * u / ((c - 1.) * u + 1.);
            assert_relative_eq!(curve.point_at(s), original.point_at(t), epsilon = 1e-10);
        }
    }

    #[test]
    fn change_end_weights_keeps_image() {
        let mut curve = sample();
        let original = curve.clone();
        curve.try_change_end_weights(0.5, 3.).unwrap();
        assert_relative_eq!(curve.weight(0).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(curve.weight(4).unwrap(), 3., epsilon = 1e-12);
        for i in 0..curve.cv_count() {
            assert_relative_eq!(curve.cv(i).unwrap(), original.cv(i).unwrap(), epsilon = 1e-12);
        }
        let (t0, t1) = curve.domain();
        assert_relative_eq!(curve.point_at(t0), original.point_at(t0), epsilon = 1e-12);
        assert_relative_eq!(curve.point_at(t1), original.point_at(t1), epsilon = 1e-12);
    }
}
