use nalgebra::{DVector, Point3, Rotation3, UnitVector3, Vector3};

use crate::error::NurbsError;
use crate::misc::{FloatingPoint, FrenetFrame};

use super::NurbsCurve;

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Frames at the given parameters, transported along a 3D curve by rotation minimizing steps
    /// # Failures
    /// - if the curve is not 3 dimensional
    /// - if the tangent vanishes at a parameter
    pub fn try_frenet_frames(&self, parameters: &[T]) -> Result<Vec<FrenetFrame<T>>, NurbsError> {
        if self.dimension() != 3 {
            return Err(NurbsError::InvalidShape(format!(
                "frames need a 3D curve, got dimension {}",
                self.dimension()
            )));
        }

        let tangents = parameters
            .iter()
            .map(|t| {
                to_vector(&self.tangent_at(*t))
                    .try_normalize(T::default_epsilon())
                    .ok_or_else(|| NurbsError::OutOfDomain(format!("tangent vanishes at {}", t)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = tangents.first() else {
            return Ok(vec![]);
        };

        // start from the world axis most orthogonal to the first tangent
        let seed = [Vector3::x(), Vector3::y(), Vector3::z()]
            .into_iter()
            .min_by(|a, b| {
                let (da, db) = (first.dot(a).abs(), first.dot(b).abs());
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or_else(Vector3::z);
        let v = first.cross(&seed).normalize();
        let mut normals = vec![first.cross(&v).normalize()];

        for (prev, next) in tangents.iter().zip(tangents.iter().skip(1)) {
            let axis = prev.cross(next);
            let normal = normals[normals.len() - 1];
            if axis.norm() > T::default_epsilon() {
                let theta = prev.dot(next).clamp(-T::one(), T::one()).acos();
                let rot = Rotation3::from_axis_angle(&UnitVector3::new_normalize(axis), theta);
                normals.push(rot * normal);
            } else {
                normals.push(normal);
            }
        }

        Ok(parameters
            .iter()
            .zip(tangents)
            .zip(normals)
            .map(|((t, tangent), normal)| {
                let position = Point3::from(to_vector(&self.point_at(*t)));
                let binormal = tangent.cross(&normal).normalize();
                FrenetFrame::new(position, tangent, normal, binormal)
            })
            .collect())
    }
}

fn to_vector<T: FloatingPoint>(v: &DVector<T>) -> Vector3<T> {
    Vector3::new(v[0], v[1], v[2])
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use crate::prelude::*;

    #[test]
    fn frames_are_orthonormal_along_a_helix() {
        let points = (0..=24)
            .map(|i| {
                let a = i as f64 * std::f64::consts::PI / 6.;
                dvector![a.cos(), a.sin(), i as f64 * 0.1]
            })
            .collect::<Vec<_>>();
        let curve = NurbsCurve::try_interpolate(&points, 3).unwrap();
        let params = (0..=10).map(|i| i as f64 / 10.).collect::<Vec<_>>();
        let frames = curve.try_frenet_frames(&params).unwrap();
        assert_eq!(frames.len(), 11);
        for f in frames.iter() {
            assert_relative_eq!(f.tangent().norm(), 1., epsilon = 1e-10);
            assert_relative_eq!(f.normal().norm(), 1., epsilon = 1e-10);
            assert_relative_eq!(f.tangent().dot(f.normal()), 0., epsilon = 1e-8);
            assert_relative_eq!(f.tangent().dot(f.binormal()), 0., epsilon = 1e-8);
        }
    }

    #[test]
    fn planar_curves_have_no_frames() {
        let points = vec![dvector![0., 0.], dvector![1., 1.], dvector![2., 0.]];
        let curve = NurbsCurve::try_interpolate(&points, 2).unwrap();
        assert!(matches!(
            curve.try_frenet_frames(&[0.5]),
            Err(NurbsError::InvalidShape(_))
        ));
    }
}
