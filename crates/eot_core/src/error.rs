//! Error types for eot_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while configuring or applying EoT transforms.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A transform was constructed with an invalid parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid tensor shape provided.
    #[error("Invalid shape: expected {expected}, got {got}")]
    InvalidShape {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        got: String,
    },

    /// Shape mismatch between tensors.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Dimension error.
    #[error("Dimension error: expected {expected} dimensions, got {got}")]
    DimensionError {
        /// Expected number of dimensions.
        expected: usize,
        /// Actual number of dimensions.
        got: usize,
    },

    /// Labels do not match the configured label type.
    #[error("Label mismatch: {0}")]
    LabelMismatch(String),

    /// Transform error.
    #[error("Transform error: {0}")]
    TransformError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CoreError {
    /// Shorthand for an [`CoreError::InvalidConfig`] error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
