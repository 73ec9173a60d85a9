use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The execution environment could not be reached. Retried with backoff.
    #[error("execution environment unavailable: {0}")]
    Unavailable(String),

    /// Anything else the adapter could not handle. Not retried.
    #[error("adapter failure: {0}")]
    Internal(String),
}

impl AdapterError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
