use thiserror::Error;

/// Error types for the levmar library.
#[derive(Error, Debug)]
pub enum LevMarError {
    /// Error indicating a fit was set up with zero or mismatched dimensions.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Error indicating a mismatch in matrix dimensions.
    #[error("Matrix dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,
}

/// Result type alias for levmar operations.
pub type Result<T> = std::result::Result<T, LevMarError>;
