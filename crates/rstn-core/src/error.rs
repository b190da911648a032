//! Error types for spatial-transform operations.

use thiserror::Error;

/// Main error type for grid generation and sampling operations.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Cooperating tensors disagree on batch, channel, or spatial dimensions.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Non-positive width, height, or batch size.
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
}

/// Result type for spatial-transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

impl TransformError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(expected: impl Into<Vec<usize>>, actual: impl Into<Vec<usize>>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid dimension error.
    pub fn invalid_dimension(msg: impl Into<String>) -> Self {
        Self::InvalidDimension(msg.into())
    }
}
