use nalgebra::{Point3, Vector3};
use simba::scalar::SupersetOf;

use crate::{error::NurbsError, misc::FloatingPoint};

/// An oriented plane in 3D space with an orthonormal frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane<T: FloatingPoint> {
    origin: Point3<T>,
    x_axis: Vector3<T>,
    y_axis: Vector3<T>,
    normal: Vector3<T>,
}

impl<T: FloatingPoint> Plane<T> {
    /// Create a plane from an origin and two in-plane directions.
    /// The y axis is made orthogonal to the x axis.
    /// # Failures
    /// - if either direction is zero or the two directions are parallel
    pub fn try_new(
        origin: Point3<T>,
        x_axis: Vector3<T>,
        y_axis: Vector3<T>,
    ) -> Result<Self, NurbsError> {
        let x_axis = x_axis
            .try_normalize(T::default_epsilon())
            .ok_or_else(|| NurbsError::InvalidShape("plane x axis is zero".into()))?;
        let y_axis = (y_axis - x_axis * x_axis.dot(&y_axis))
            .try_normalize(T::default_epsilon())
            .ok_or_else(|| {
                NurbsError::InvalidShape("plane y axis is zero or parallel to x axis".into())
            })?;
        Ok(Self {
            origin,
            x_axis,
            y_axis,
            normal: x_axis.cross(&y_axis),
        })
    }

    /// The XY plane through the world origin
    pub fn world_xy() -> Self {
        Self {
            origin: Point3::origin(),
            x_axis: Vector3::x(),
            y_axis: Vector3::y(),
            normal: Vector3::z(),
        }
    }

    pub fn origin(&self) -> &Point3<T> {
        &self.origin
    }

    pub fn x_axis(&self) -> &Vector3<T> {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &Vector3<T> {
        &self.y_axis
    }

    pub fn normal(&self) -> &Vector3<T> {
        &self.normal
    }

    /// Point at plane coordinates `(u, v)`
    pub fn point_at(&self, u: T, v: T) -> Point3<T> {
        self.origin + self.x_axis * u + self.y_axis * v
    }

    /// Calculate the signed distance from a point to the plane.
    pub fn signed_distance(&self, point: &Point3<T>) -> T {
        self.normal.dot(&(point - self.origin))
    }

    /// Cast the plane to a different floating point type.
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> Plane<F> {
        Plane {
            origin: self.origin.cast(),
            x_axis: self.x_axis.cast(),
            y_axis: self.y_axis.cast(),
            normal: self.normal.cast(),
        }
    }
}
