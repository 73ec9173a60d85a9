use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Problem file error: {0}")]
    ProblemFile(String),
}

impl From<toml::de::Error> for WorkerError {
    fn from(e: toml::de::Error) -> Self {
        WorkerError::ProblemFile(e.to_string())
    }
}

/// Why a judging pass ended without a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgeError {
    #[error("Judging cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, WorkerError>;
