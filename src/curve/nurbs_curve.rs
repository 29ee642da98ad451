use gauss_quad::GaussLegendre;
use itertools::Itertools;
use nalgebra::DVector;
use simba::scalar::SupersetOf;

use crate::error::NurbsError;
use crate::knot::{KnotStyle, KnotVector};
use crate::misc::{
    is_valid_weight, real, Binomial, FloatingPoint, Invertible, MAX_NURBS_DEGREE, ZERO_TOLERANCE,
};

use super::{dehomogenize, ControlPoints, PointStyle};

/// NURBS curve representation
/// The spatial dimension is chosen at runtime and the scalar type by generics (f32 or f64).
///
/// Knots are stored in the compact form without the two superfluous end knots,
/// so `knot_count() == cv_count() + order() - 2`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "NurbsCurveData<T>")
)]
pub struct NurbsCurve<T: FloatingPoint> {
    dimension: usize,
    /// degree + 1
    order: usize,
    control_points: ControlPoints<T>,
    knots: KnotVector<T>,
}

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Create a validated curve from its parts
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    ///
    /// let curve = NurbsCurve::try_new(
    ///     2,
    ///     3,
    ///     ControlPoints::Cartesian(vec![dvector![0., 0.], dvector![1., 1.], dvector![2., 0.]]),
    ///     vec![0., 0., 1., 1.],
    /// );
    /// assert!(curve.is_ok());
    /// ```
    pub fn try_new(
        dimension: usize,
        order: usize,
        control_points: ControlPoints<T>,
        knots: Vec<T>,
    ) -> Result<Self, NurbsError> {
        let curve = Self::new_unchecked(dimension, order, control_points, KnotVector::new(knots));
        curve.validate()?;
        Ok(curve)
    }

    pub(crate) fn new_unchecked(
        dimension: usize,
        order: usize,
        control_points: ControlPoints<T>,
        knots: KnotVector<T>,
    ) -> Self {
        Self {
            dimension,
            order,
            control_points,
            knots,
        }
    }

    /// Allocate a curve of the given shape
    /// Control points start at the origin with unit weight and the knots are clamped uniform.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    ///
    /// let curve = NurbsCurve::<f64>::try_create(3, true, 4, 6).unwrap();
    /// assert!(curve.is_valid());
    /// assert_eq!(curve.knot_count(), 8);
    /// assert_eq!(curve.cv_size(), 4);
    /// ```
    pub fn try_create(
        dimension: usize,
        rational: bool,
        order: usize,
        cv_count: usize,
    ) -> Result<Self, NurbsError> {
        check_shape(dimension, order, cv_count)?;
        let origin = DVector::<T>::zeros(dimension);
        let control_points = if rational {
            ControlPoints::Homogeneous(vec![origin.push(T::one()); cv_count])
        } else {
            ControlPoints::Cartesian(vec![origin; cv_count])
        };
        Ok(Self::new_unchecked(
            dimension,
            order,
            control_points,
            KnotVector::clamped_uniform(order, cv_count, T::one()),
        ))
    }

    /// Create a clamped non-rational curve using `points` as control points
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    ///
    /// let points = vec![dvector![0., 0.], dvector![1., 2.], dvector![3., 2.], dvector![4., 0.]];
    /// let curve = NurbsCurve::try_clamped_uniform(2, 3, &points, 0.5).unwrap();
    /// assert_eq!(curve.knots().to_vec(), vec![0., 0., 0.5, 1., 1.]);
    /// assert_eq!(curve.point_at(1.), points[3]);
    /// ```
    pub fn try_clamped_uniform(
        dimension: usize,
        order: usize,
        points: &[DVector<T>],
        knot_delta: T,
    ) -> Result<Self, NurbsError> {
        check_shape(dimension, order, points.len())?;
        check_points(dimension, points)?;
        check_knot_delta(knot_delta)?;
        let curve = Self::new_unchecked(
            dimension,
            order,
            ControlPoints::Cartesian(points.to_vec()),
            KnotVector::clamped_uniform(order, points.len(), knot_delta),
        );
        curve.validate()?;
        Ok(curve)
    }

    /// Create a closed periodic non-rational curve
    /// The first `order - 1` points are repeated at the end of the control polygon.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![dvector![1., 0.], dvector![0., 1.], dvector![-1., 0.], dvector![0., -1.]];
    /// let curve = NurbsCurve::try_periodic_uniform(2, 4, &points, 1.).unwrap();
    /// assert_eq!(curve.cv_count(), 7);
    /// let (start, end) = curve.domain();
    /// assert_relative_eq!(curve.point_at(start), curve.point_at(end), epsilon = 1e-12);
    /// ```
    pub fn try_periodic_uniform(
        dimension: usize,
        order: usize,
        points: &[DVector<T>],
        knot_delta: T,
    ) -> Result<Self, NurbsError> {
        if dimension < 1 || order < 2 {
            return Err(NurbsError::InvalidShape(format!(
                "dimension {} and order {} are too small",
                dimension, order
            )));
        }
        let n = points.len();
        if n < 2.max(order - 1) {
            return Err(NurbsError::InvalidShape(format!(
                "{} points are too few for a periodic curve of order {}",
                n, order
            )));
        }
        check_points(dimension, points)?;
        check_knot_delta(knot_delta)?;

        let cv_count = n + order - 1;
        let control_points = (0..cv_count).map(|i| points[i % n].clone()).collect();
        let curve = Self::new_unchecked(
            dimension,
            order,
            ControlPoints::Cartesian(control_points),
            KnotVector::periodic_uniform(order, cv_count, knot_delta),
        );
        curve.validate()?;
        Ok(curve)
    }

    /// Create a control point curve through a polyline
    ///
    /// A polyline with at least 4 points whose ends coincide is treated as closed
    /// and yields a periodic curve. The degree is clamped to `[1, MAX_NURBS_DEGREE]`
    /// and lowered to `points.len() - 1` for short polylines.
    /// The domain of the result is `[0, length]` when the length can be computed.
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![dvector![0., 0., 0.], dvector![3., 0., 0.], dvector![3., 4., 0.]];
    /// let curve = NurbsCurve::try_through_points(&points, 1).unwrap();
    /// let (start, end) = curve.domain();
    /// assert_eq!(start, 0.);
    /// assert_relative_eq!(end, 7., epsilon = 1e-10);
    /// ```
    pub fn try_through_points(points: &[DVector<T>], degree: usize) -> Result<Self, NurbsError> {
        if points.len() < 2 {
            return Err(NurbsError::InvalidShape(
                "at least 2 points are required".to_string(),
            ));
        }
        let dimension = points[0].len();
        check_points(dimension, points)?;

        let count = points.len();
        let tolerance = real::<T>(ZERO_TOLERANCE);
        let closed = count >= 4 && (&points[0] - &points[count - 1]).norm() <= tolerance;

        let mut degree = degree.clamp(1, MAX_NURBS_DEGREE);
        if count <= degree {
            degree = count - 1;
        }

        let mut curve = if closed {
            let mut rotated = points.to_vec();
            for _ in 0..(degree - 1) / 2 {
                rotated.pop();
                if let Some(last) = rotated.last().cloned() {
                    rotated.insert(0, last);
                }
            }
            Self::try_periodic_uniform(dimension, degree + 1, &rotated[..(count - 1)], T::one())?
        } else {
            Self::try_clamped_uniform(dimension, degree + 1, points, T::one())?
        };

        if let Err(e) = curve.validate() {
            log::warn!("discarding curve through {} points: {}", count, e);
            return Err(e);
        }

        if let Ok(length) = curve.try_length() {
            if length > T::zero() {
                curve.set_domain(T::zero(), length)?;
            }
        }

        log::debug!(
            "created degree {} {} curve through {} points",
            degree,
            if closed { "periodic" } else { "clamped" },
            count
        );
        Ok(curve)
    }

    /// Check the structural and numeric validity of the curve
    pub fn validate(&self) -> Result<(), NurbsError> {
        let fail = |message: String| Err(NurbsError::ValidationFailed(message));

        if self.dimension < 1 {
            return fail("dimension must be at least 1".to_string());
        }
        if self.order < 2 {
            return fail(format!("order {} is less than 2", self.order));
        }
        let cv_count = self.cv_count();
        if cv_count < self.order {
            return fail(format!(
                "{} control points are too few for order {}",
                cv_count, self.order
            ));
        }
        if self.knots.len() != cv_count + self.order - 2 {
            return fail(format!(
                "knot count {} does not match {} control points of order {}",
                self.knots.len(),
                cv_count,
                self.order
            ));
        }

        let cv_size = self.cv_size();
        for (i, p) in self.control_points.raw().iter().enumerate() {
            if p.len() != cv_size {
                return fail(format!("control point {} has {} coordinates", i, p.len()));
            }
            if p.iter().any(|v| !v.to_f64().is_some_and(f64::is_finite)) {
                return fail(format!("control point {} is not finite", i));
            }
        }
        if let Some(i) = self
            .control_points
            .weights()
            .into_iter()
            .position(|w| !is_valid_weight(w))
        {
            return fail(format!("weight {} is not positive", i));
        }

        let k = self.knots.as_slice();
        if k.iter().any(|v| !v.to_f64().is_some_and(f64::is_finite)) {
            return fail("knots are not finite".to_string());
        }
        if !self.knots.is_non_decreasing() {
            return fail("knots are decreasing".to_string());
        }
        if k[self.order - 2] >= k[self.order - 1] {
            return fail("the first span is empty".to_string());
        }
        if k[cv_count - 2] >= k[cv_count - 1] {
            return fail("the last span is empty".to_string());
        }
        if let Some(m) = self
            .knots
            .multiplicity()
            .iter()
            .find(|m| m.multiplicity() > self.degree())
        {
            return fail(format!(
                "knot {} has multiplicity {} above the degree {}",
                m.knot(),
                m.multiplicity(),
                self.degree()
            ));
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn degree(&self) -> usize {
        self.order - 1
    }

    pub fn cv_count(&self) -> usize {
        self.control_points.len()
    }

    pub fn knot_count(&self) -> usize {
        self.knots.len()
    }

    pub fn is_rational(&self) -> bool {
        self.control_points.is_rational()
    }

    /// Number of stored coordinates per control point
    pub fn cv_size(&self) -> usize {
        if self.is_rational() {
            self.dimension + 1
        } else {
            self.dimension
        }
    }

    pub fn cv_style(&self) -> PointStyle {
        self.control_points.style()
    }

    pub fn control_points(&self) -> &ControlPoints<T> {
        &self.control_points
    }

    pub(crate) fn control_points_mut(&mut self) -> &mut ControlPoints<T> {
        &mut self.control_points
    }

    pub fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    pub(crate) fn knots_mut(&mut self) -> &mut KnotVector<T> {
        &mut self.knots
    }

    pub fn weights(&self) -> Vec<T> {
        self.control_points.weights()
    }

    pub fn knot_style(&self) -> KnotStyle {
        KnotStyle::classify(&self.knots, self.order)
    }

    /// Knot vector with the superfluous end knots restored
    pub(crate) fn padded_knots(&self) -> KnotVector<T> {
        self.knots.padded(self.order)
    }

    /// Replace knots and control points from the output of a padded algorithm
    pub(crate) fn replace_padded(&mut self, padded: &[T], points: Vec<DVector<T>>) {
        self.knots = KnotVector::from_padded(padded);
        self.control_points = self.control_points.with_raw(points);
    }

    pub(crate) fn set_order(&mut self, order: usize) {
        self.order = order;
    }

    pub fn domain(&self) -> (T, T) {
        self.knots.domain(self.order)
    }

    /// Rescale the knots so that the domain becomes `[t0, t1]`
    pub fn set_domain(&mut self, t0: T, t1: T) -> Result<(), NurbsError> {
        if !(t0 < t1) {
            return Err(NurbsError::OutOfDomain(format!(
                "domain [{}, {}] is empty",
                t0, t1
            )));
        }
        let domain = self.domain();
        if domain != (t0, t1) {
            self.knots.remap(domain, (t0, t1));
        }
        Ok(())
    }

    /// Number of non-empty spans
    pub fn span_count(&self) -> usize {
        self.span_vector().len().saturating_sub(1)
    }

    /// Distinct knot values bounding the non-empty spans
    pub fn span_vector(&self) -> Vec<T> {
        self.knots.span_vector(self.order)
    }

    pub fn greville_abscissa(&self, index: usize) -> Result<T, NurbsError> {
        NurbsError::check_index(index, self.cv_count())?;
        Ok(self.knots.greville_abscissa(self.order, index))
    }

    pub fn greville_abscissae(&self) -> Vec<T> {
        (0..self.cv_count())
            .map(|i| self.knots.greville_abscissa(self.order, i))
            .collect()
    }

    /// Evaluate the curve at a given parameter to get a euclidean point
    pub fn point_at(&self, t: T) -> DVector<T> {
        let point = self.homogeneous_point_at(t);
        if self.is_rational() {
            dehomogenize(&point)
        } else {
            point
        }
    }

    fn homogeneous_point_at(&self, t: T) -> DVector<T> {
        let degree = self.degree();
        let knots = self.padded_knots();
        let n = self.cv_count() - 1;
        let knot_span_index = knots.find_knot_span_index(n, degree, t);
        let basis = knots.basis_functions(knot_span_index, t, degree);
        let points = self.control_points.raw();
        let mut position = DVector::zeros(self.cv_size());
        for (i, b) in basis.iter().enumerate() {
            position += &points[knot_span_index - degree + i] * *b;
        }
        position
    }

    /// Evaluate the curve at a given parameter to get its first derivative
    pub fn tangent_at(&self, t: T) -> DVector<T> {
        let mut derivs = self.derivatives_at(t, 1);
        derivs.swap_remove(1)
    }

    /// Evaluate the point and the first `derivs` derivatives of the euclidean curve
    pub fn derivatives_at(&self, t: T, derivs: usize) -> Vec<DVector<T>> {
        let ders = self.homogeneous_derivatives(t, derivs);
        if !self.is_rational() {
            return ders;
        }

        let dim = self.dimension;
        let a_ders: Vec<DVector<T>> = ders.iter().map(|d| d.rows(0, dim).into_owned()).collect();
        let w_ders: Vec<T> = ders.iter().map(|d| d[dim]).collect();

        let mut ck: Vec<DVector<T>> = vec![];
        let mut binom = Binomial::<T>::new();
        for k in 0..=derivs {
            let mut v = a_ders[k].clone();
            for i in 1..=k {
                let coef = binom.get(k, i) * w_ders[i];
                v -= &ck[k - i] * coef;
            }
            ck.push(v / w_ders[0]);
        }
        ck
    }

    fn homogeneous_derivatives(&self, t: T, derivs: usize) -> Vec<DVector<T>> {
        let degree = self.degree();
        let knots = self.padded_knots();
        let n = self.cv_count() - 1;
        let du = derivs.min(degree);
        let mut derivatives = vec![DVector::zeros(self.cv_size()); derivs + 1];

        let knot_span_index = knots.find_knot_span_index(n, degree, t);
        let nders = knots.derivative_basis_functions(knot_span_index, t, degree, du);
        let points = self.control_points.raw();
        for k in 0..=du {
            for j in 0..=degree {
                derivatives[k] += &points[knot_span_index - degree + j] * nders[k][j];
            }
        }
        derivatives
    }

    /// Compute the length of the curve by gauss-legendre quadrature over each span
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let w = std::f64::consts::FRAC_1_SQRT_2;
    /// let quarter = NurbsCurve::try_new(
    ///     2,
    ///     3,
    ///     ControlPoints::Homogeneous(vec![dvector![1., 0., 1.], dvector![w, w, w], dvector![0., 1., 1.]]),
    ///     vec![0., 0., 1., 1.],
    /// ).unwrap();
    /// assert_relative_eq!(quarter.try_length().unwrap(), std::f64::consts::FRAC_PI_2, epsilon = 1e-10);
    /// ```
    pub fn try_length(&self) -> Result<T, NurbsError> {
        let (t0, t1) = self.domain();
        self.try_length_between(t0, t1)
    }

    /// Arc length of the part of the curve between the parameters `t0` and `t1`
    pub fn try_length_between(&self, t0: T, t1: T) -> Result<T, NurbsError> {
        let gauss = GaussLegendre::new(16 + self.degree())
            .map_err(|e| NurbsError::OutOfDomain(e.to_string()))?;
        let spans = self.span_vector();
        let mut length = 0f64;
        for (a, b) in spans.iter().tuple_windows() {
            let (a, b) = ((*a).max(t0), (*b).min(t1));
            if a >= b {
                continue;
            }
            let left = a.to_f64().unwrap_or(f64::NAN);
            let right = b.to_f64().unwrap_or(f64::NAN);
            length += gauss.integrate(left, right, |x| {
                let deriv = self.derivatives_at(real::<T>(x), 1);
                deriv[1].norm().to_f64().unwrap_or(f64::NAN)
            });
        }
        if length.is_finite() {
            Ok(real::<T>(length))
        } else {
            Err(NurbsError::OutOfDomain(
                "length integral did not converge".to_string(),
            ))
        }
    }

    /// Sum of the distances between consecutive euclidean control points
    pub fn control_polygon_length(&self) -> T {
        (0..self.cv_count())
            .map(|i| self.control_points.euclidean(i))
            .tuple_windows()
            .map(|(a, b)| (b - a).norm())
            .fold(T::zero(), |acc, d| acc + d)
    }

    /// Check if two curves have the same shape, control points and knots
    ///
    /// Control points match when their euclidean locations and weights agree within `tolerance`.
    /// With `ignore_parameterization`, knots are compared after mapping both domains onto `[0, 1]`.
    pub fn is_duplicate(&self, other: &Self, ignore_parameterization: bool, tolerance: T) -> bool {
        if self.dimension != other.dimension
            || self.is_rational() != other.is_rational()
            || self.order != other.order
            || self.cv_count() != other.cv_count()
        {
            return false;
        }

        let tolerance = tolerance.max(real::<T>(ZERO_TOLERANCE));
        let same_points = (0..self.cv_count()).all(|i| {
            let d = (self.control_points.euclidean(i) - other.control_points.euclidean(i)).norm();
            let w = (self.control_points.weight(i) - other.control_points.weight(i)).abs();
            d <= tolerance && w <= tolerance
        });
        if !same_points {
            return false;
        }

        let normalize = |curve: &Self| -> Vec<T> {
            let (t0, t1) = curve.domain();
            let mut knots = curve.knots.clone();
            if ignore_parameterization {
                knots.remap((t0, t1), (T::zero(), T::one()));
            }
            knots.to_vec()
        };
        let (a, b) = (normalize(self), normalize(other));
        let (t0, t1) = self.domain();
        let knot_tolerance = real::<T>(ZERO_TOLERANCE)
            * if ignore_parameterization {
                T::one()
            } else {
                T::one().max(t1.abs()).max(t0.abs())
            };
        a.iter()
            .zip(b.iter())
            .all(|(x, y)| (*x - *y).abs() <= knot_tolerance)
    }

    /// Cast the curve to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> NurbsCurve<F> {
        let points = self
            .control_points
            .raw()
            .iter()
            .map(|p| p.clone().cast::<F>())
            .collect();
        let control_points = match self.control_points {
            ControlPoints::Cartesian(_) => ControlPoints::Cartesian(points),
            ControlPoints::Homogeneous(_) => ControlPoints::Homogeneous(points),
        };
        NurbsCurve::new_unchecked(self.dimension, self.order, control_points, self.knots.cast())
    }
}

impl<T: FloatingPoint> Invertible for NurbsCurve<T> {
    /// Reverse the direction of the curve
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// use nalgebra::dvector;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![dvector![0., 0.], dvector![1., 2.], dvector![3., 2.], dvector![4., 0.]];
    /// let mut curve = NurbsCurve::try_clamped_uniform(2, 3, &points, 1.).unwrap();
    /// curve.invert();
    /// let (start, end) = curve.domain();
    /// assert_relative_eq!(curve.point_at(start), points[3]);
    /// assert_relative_eq!(curve.point_at(end), points[0]);
    /// ```
    fn invert(&mut self) {
        self.control_points.raw_mut().reverse();
        self.knots.invert();
    }
}

pub(crate) fn check_shape(dimension: usize, order: usize, cv_count: usize) -> Result<(), NurbsError> {
    if dimension < 1 {
        return Err(NurbsError::InvalidShape(
            "dimension must be at least 1".to_string(),
        ));
    }
    if order < 2 {
        return Err(NurbsError::InvalidShape(format!(
            "order {} is less than 2",
            order
        )));
    }
    if cv_count < order {
        return Err(NurbsError::InvalidShape(format!(
            "{} control points are too few for order {}",
            cv_count, order
        )));
    }
    Ok(())
}

pub(crate) fn check_points<T: FloatingPoint>(dimension: usize, points: &[DVector<T>]) -> Result<(), NurbsError> {
    match points.iter().position(|p| p.len() != dimension) {
        Some(i) => Err(NurbsError::InvalidShape(format!(
            "point {} has {} coordinates, expected {}",
            i,
            points[i].len(),
            dimension
        ))),
        None => Ok(()),
    }
}

pub(crate) fn check_knot_delta<T: FloatingPoint>(delta: T) -> Result<(), NurbsError> {
    if delta > T::zero() && delta.to_f64().is_some_and(f64::is_finite) {
        Ok(())
    } else {
        Err(NurbsError::InvalidShape(format!(
            "knot spacing {} is not positive",
            delta
        )))
    }
}

/// Unvalidated field layout used to deserialize a curve
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct NurbsCurveData<T: FloatingPoint> {
    dimension: usize,
    order: usize,
    control_points: ControlPoints<T>,
    knots: KnotVector<T>,
}

#[cfg(feature = "serde")]
impl<T: FloatingPoint> TryFrom<NurbsCurveData<T>> for NurbsCurve<T> {
    type Error = NurbsError;

    fn try_from(data: NurbsCurveData<T>) -> Result<Self, Self::Error> {
        let curve = Self::new_unchecked(data.dimension, data.order, data.control_points, data.knots);
        curve.validate()?;
        Ok(curve)
    }
}
