use nalgebra::DVector;

use crate::misc::FloatingPoint;

/// Storage layout of control points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointStyle {
    /// Euclidean coordinates only
    NotRational,
    /// Weighted coordinates followed by the weight, `(w·x, w·y, …, w)`
    HomogeneousRational,
}

/// Control points of a curve
/// The variant carries the rational flag, so a non-rational curve never stores weights
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlPoints<T: FloatingPoint> {
    /// `dimension` coordinates per point
    Cartesian(Vec<DVector<T>>),
    /// `dimension + 1` coordinates per point, the last one is the weight
    Homogeneous(Vec<DVector<T>>),
}

impl<T: FloatingPoint> ControlPoints<T> {
    pub fn len(&self) -> usize {
        self.raw().len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    pub fn is_rational(&self) -> bool {
        matches!(self, ControlPoints::Homogeneous(_))
    }

    pub fn style(&self) -> PointStyle {
        match self {
            ControlPoints::Cartesian(_) => PointStyle::NotRational,
            ControlPoints::Homogeneous(_) => PointStyle::HomogeneousRational,
        }
    }

    /// Stored vectors, homogeneous when rational.
    /// Knot insertion, degree elevation and the other linear algorithms run directly on them.
    pub fn raw(&self) -> &[DVector<T>] {
        match self {
            ControlPoints::Cartesian(points) | ControlPoints::Homogeneous(points) => points,
        }
    }

    pub(crate) fn raw_mut(&mut self) -> &mut Vec<DVector<T>> {
        match self {
            ControlPoints::Cartesian(points) | ControlPoints::Homogeneous(points) => points,
        }
    }

    /// Wrap raw vectors in the same variant as `self`
    pub(crate) fn with_raw(&self, points: Vec<DVector<T>>) -> Self {
        match self {
            ControlPoints::Cartesian(_) => ControlPoints::Cartesian(points),
            ControlPoints::Homogeneous(_) => ControlPoints::Homogeneous(points),
        }
    }

    pub fn weight(&self, index: usize) -> T {
        match self {
            ControlPoints::Cartesian(_) => T::one(),
            ControlPoints::Homogeneous(points) => points[index][points[index].len() - 1],
        }
    }

    pub fn weights(&self) -> Vec<T> {
        (0..self.len()).map(|i| self.weight(i)).collect()
    }

    /// Euclidean location of the point at `index`
    pub fn euclidean(&self, index: usize) -> DVector<T> {
        match self {
            ControlPoints::Cartesian(points) => points[index].clone(),
            ControlPoints::Homogeneous(points) => dehomogenize(&points[index]),
        }
    }

    /// Homogeneous form of the point at `index`, the weight is 1 when not rational
    pub fn homogeneous(&self, index: usize) -> DVector<T> {
        match self {
            ControlPoints::Cartesian(points) => points[index].push(T::one()),
            ControlPoints::Homogeneous(points) => points[index].clone(),
        }
    }

    /// Convert to the homogeneous variant with unit weights
    pub fn into_rational(self) -> Self {
        match self {
            ControlPoints::Cartesian(points) => {
                ControlPoints::Homogeneous(points.into_iter().map(|p| p.push(T::one())).collect())
            }
            rational => rational,
        }
    }
}

/// Divide the leading coordinates of a homogeneous vector by its weight
pub fn dehomogenize<T: FloatingPoint>(point: &DVector<T>) -> DVector<T> {
    let dim = point.len() - 1;
    let w = point[dim];
    point.rows(0, dim).map(|v| v / w)
}

/// Append the weight to a euclidean point scaled by it
pub fn homogenize<T: FloatingPoint>(point: &DVector<T>, weight: T) -> DVector<T> {
    (point * weight).push(weight)
}

#[cfg(test)]
mod tests {
    use nalgebra::dvector;

    use super::*;

    #[test]
    fn homogeneous_round_trip() {
        let points = ControlPoints::Homogeneous(vec![dvector![2., 4., 2.], dvector![1., 1., 1.]]);
        assert!(points.is_rational());
        assert_eq!(points.weight(0), 2.);
        assert_eq!(points.euclidean(0), dvector![1., 2.]);
        assert_eq!(homogenize(&points.euclidean(0), 2.), points.homogeneous(0));
    }

    #[test]
    fn promote_to_rational() {
        let points = ControlPoints::Cartesian(vec![dvector![1., 2.], dvector![3., 4.]]);
        assert_eq!(points.weights(), vec![1., 1.]);
        let rational = points.into_rational();
        assert_eq!(rational.style(), PointStyle::HomogeneousRational);
        assert_eq!(rational.raw()[1], dvector![3., 4., 1.]);
    }
}
