pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

pub use config::{JudgeSettings, WorkerAppConfig, WorkerConfig};
pub use error::{JudgeError, Result, WorkerError};
pub use models::{
    AdapterError, BinaryScoring, Comparison, ExecutionAdapter, ExecutionOutcome,
    ExecutionRequest, JudgePipeline, LocalProcessAdapter, ScoringPolicy, TerminationReason,
    compare,
};
