use common::validation::ValidationError;
use thiserror::Error;

/// Platform-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// Malformed authoring or submission input.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// The request is well-formed but clashes with current state.
    #[error("{0}")]
    Conflict(String),
    /// Judging cannot accept or finish work right now. Retry later.
    #[error("{0}")]
    Unavailable(String),
}

impl PlatformError {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `CONFLICT`, `UNAVAILABLE`.
    pub fn code(&self) -> &'static str {
        match self {
            PlatformError::Validation(_) => "VALIDATION_ERROR",
            PlatformError::NotFound(_) => "NOT_FOUND",
            PlatformError::Conflict(_) => "CONFLICT",
            PlatformError::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

impl From<ValidationError> for PlatformError {
    fn from(err: ValidationError) -> Self {
        PlatformError::Validation(err.0)
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
