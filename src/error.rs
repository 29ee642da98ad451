use thiserror::Error;

/// Failure causes of curve construction and editing.
/// A failed operation never leaves the curve partially modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NurbsError {
    /// An index does not address an existing knot, control point or span
    #[error("index {index} is out of range (length {len})")]
    InvalidIndex { index: usize, len: usize },

    /// Malformed shape parameters: order, counts, dimensions, spacing
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// A constructed or edited curve does not pass the validity check
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A parameter or weight lies outside its permitted range
    #[error("out of domain: {0}")]
    OutOfDomain(String),
}

impl NurbsError {
    pub(crate) fn check_index(index: usize, len: usize) -> Result<(), Self> {
        if index < len {
            Ok(())
        } else {
            Err(Self::InvalidIndex { index, len })
        }
    }
}
