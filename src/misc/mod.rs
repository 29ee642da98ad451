pub mod binomial;
pub mod floating_point;
pub mod frenet_frame;
pub mod invertible;
pub mod plane;

pub use binomial::*;
pub use floating_point::*;
pub use frenet_frame::*;
pub use invertible::*;
pub use plane::*;
