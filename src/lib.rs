#![allow(clippy::needless_range_loop)]

mod curve;
mod error;
mod interpolation;
mod knot;
mod misc;
mod model;
mod primitive;

pub mod prelude {
    pub use crate::curve::*;
    pub use crate::error::*;
    pub use crate::interpolation::*;
    pub use crate::knot::*;
    pub use crate::misc::*;
    pub use crate::model::*;
    pub use crate::primitive::*;
}
