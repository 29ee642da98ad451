pub mod append;
pub mod bezier_curve;
pub mod control_points;
pub mod degree;
pub mod frames;
mod helper;
pub mod knot_editing;
pub mod nurbs_curve;
pub mod span;
pub mod weights;

pub use bezier_curve::*;
pub use control_points::*;
pub use nurbs_curve::*;
