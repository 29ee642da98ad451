pub mod knot_multiplicity;
pub mod knot_style;
pub mod knot_vector;
pub use knot_multiplicity::*;
pub use knot_style::*;
pub use knot_vector::*;

/// End of a curve or knot vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurveEnd {
    Start,
    End,
}
