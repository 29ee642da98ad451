pub mod curve;
pub mod parameterization;

pub use parameterization::*;
