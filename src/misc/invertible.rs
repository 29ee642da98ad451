/// Trait for types that can be inverted.
/// For curves and knot vectors this reverses the direction of parameterization.
pub trait Invertible: Clone {
    fn invert(&mut self);
    fn inverse(&self) -> Self {
        let mut inv = self.clone();
        inv.invert();
        inv
    }
}
