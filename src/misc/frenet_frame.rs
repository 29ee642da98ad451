use nalgebra::{Point3, Vector3};

use crate::misc::FloatingPoint;

/// A moving frame at a point on a space curve
/// `normal` and `binormal` span the plane orthogonal to `tangent`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrenetFrame<T: FloatingPoint> {
    position: Point3<T>,
    tangent: Vector3<T>,
    normal: Vector3<T>,
    binormal: Vector3<T>,
}

impl<T: FloatingPoint> FrenetFrame<T> {
    pub fn new(
        position: Point3<T>,
        tangent: Vector3<T>,
        normal: Vector3<T>,
        binormal: Vector3<T>,
    ) -> Self {
        Self {
            position,
            tangent,
            normal,
            binormal,
        }
    }

    pub fn position(&self) -> &Point3<T> {
        &self.position
    }

    pub fn tangent(&self) -> &Vector3<T> {
        &self.tangent
    }

    pub fn normal(&self) -> &Vector3<T> {
        &self.normal
    }

    pub fn binormal(&self) -> &Vector3<T> {
        &self.binormal
    }

    /// Point at `(x, y)` in the normal plane of the frame
    pub fn point_at(&self, x: T, y: T) -> Point3<T> {
        self.position + self.normal * x + self.binormal * y
    }

    /// Coordinates of a point projected on the normal plane of the frame
    pub fn project(&self, point: &Point3<T>) -> (T, T) {
        let v = point - self.position;
        (v.dot(&self.normal), v.dot(&self.binormal))
    }
}
