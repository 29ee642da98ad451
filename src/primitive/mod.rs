pub mod ellipse;
pub mod spiral;

pub use ellipse::*;
pub use spiral::*;
