use nalgebra::{DMatrix, DVector};

use crate::curve::nurbs_curve::check_points;
use crate::curve::{ControlPoints, NurbsCurve};
use crate::error::NurbsError;
use crate::knot::KnotVector;
use crate::misc::{real, FloatingPoint, MAX_NURBS_DEGREE};

use super::Parameterization;

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Create a clamped curve passing through every point, with chord length parameters
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![
    ///     dvector![-1., -1., 0.],
    ///     dvector![1., -1., 0.],
    ///     dvector![1., 1., 0.],
    ///     dvector![-1., 1., 0.],
    ///     dvector![-1., 2., 0.],
    ///     dvector![1., 2.5, 0.],
    /// ];
    /// let curve = NurbsCurve::try_interpolate(&points, 3).unwrap();
    /// let (start, end) = curve.domain();
    /// assert_relative_eq!(curve.point_at(start), points[0]);
    /// assert_relative_eq!(curve.point_at(end), points[5], epsilon = 1e-10);
    /// ```
    pub fn try_interpolate(points: &[DVector<T>], degree: usize) -> Result<Self, NurbsError> {
        Self::try_interpolate_with(points, degree, Parameterization::Chordal)
    }

    /// Create a clamped curve passing through every point on the domain `[0, 1]`
    pub fn try_interpolate_with(
        points: &[DVector<T>],
        degree: usize,
        parameterization: Parameterization,
    ) -> Result<Self, NurbsError> {
        if degree < 1 || degree > MAX_NURBS_DEGREE {
            return Err(NurbsError::InvalidShape(format!(
                "cannot interpolate with degree {}",
                degree
            )));
        }
        let n = points.len();
        if n < degree + 1 {
            return Err(NurbsError::InvalidShape(format!(
                "{} points are too few for degree {}",
                n, degree
            )));
        }
        let dimension = points[0].len();
        check_points(dimension, points)?;

        let params = parameterization
            .parameterize(points)
            .ok_or_else(|| NurbsError::InvalidShape("points are coincident".to_string()))?;

        // knots by averaging the parameters
        let inv = T::one() / real::<T>(degree as f64);
        let mut knots = vec![T::zero(); degree + 1];
        for i in 1..(n - degree) {
            let sum = params[i..(i + degree)]
                .iter()
                .fold(T::zero(), |acc, u| acc + *u);
            knots.push(sum * inv);
        }
        knots.extend(std::iter::repeat_n(T::one(), degree + 1));
        let knots = KnotVector::new(knots);

        let mut m_a = DMatrix::<T>::zeros(n, n);
        for (i, u) in params.iter().enumerate() {
            let span = knots.find_knot_span_index(n - 1, degree, *u);
            let basis = knots.basis_functions(span, *u, degree);
            for (j, b) in basis.into_iter().enumerate() {
                m_a[(i, span - degree + j)] = b;
            }
        }

        let m_b = DMatrix::from_fn(n, dimension, |i, j| points[i][j]);
        let solved = m_a
            .lu()
            .solve(&m_b)
            .ok_or_else(|| NurbsError::InvalidShape("interpolation system is singular".to_string()))?;

        let control_points = (0..n)
            .map(|i| DVector::from_iterator(dimension, solved.row(i).iter().copied()))
            .collect();

        Self::try_new(
            dimension,
            degree + 1,
            ControlPoints::Cartesian(control_points),
            KnotVector::from_padded(knots.as_slice()).to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use crate::prelude::*;

    #[test]
    fn passes_through_points() {
        let points = vec![
            dvector![0., 0.],
            dvector![1., 2.],
            dvector![3., 3.],
            dvector![4., 1.],
            dvector![6., 0.],
        ];
        for parameterization in [
            Parameterization::Uniform,
            Parameterization::Chordal,
            Parameterization::Centripetal,
        ] {
            let curve = NurbsCurve::try_interpolate_with(&points, 3, parameterization).unwrap();
            assert_eq!(curve.cv_count(), 5);
            assert!(curve.is_clamped(CurveEnd::Start) && curve.is_clamped(CurveEnd::End));
            let params = parameterization.parameterize(&points).unwrap();
            for (p, u) in points.iter().zip(params) {
                assert_relative_eq!(curve.point_at(u), *p, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn rejects_too_few_points() {
        let points = vec![dvector![0., 0.], dvector![1., 2.]];
        assert!(matches!(
            NurbsCurve::try_interpolate(&points, 2),
            Err(NurbsError::InvalidShape(_))
        ));
        assert!(NurbsCurve::try_interpolate(&points, 1).is_ok());
    }
}
