pub mod error;
pub mod local;

use async_trait::async_trait;
use error::AdapterError;
use serde::{Deserialize, Serialize};

/// One program run requested by the judging pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub language: String,
    pub source: String,
    pub stdin: String,
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
}

/// Why the program stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminationReason {
    /// Compilation or environment setup for the program failed.
    CompileFailure,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    /// Non-zero exit or killed by a signal.
    RuntimeFailure {
        exit_code: Option<i32>,
        signal: Option<i32>,
    },
    /// Exit code 0.
    Exited,
}

/// Raw report of one program run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub termination: TerminationReason,
    pub elapsed_ms: u32,
    pub peak_memory_mb: u32,
}

impl ExecutionOutcome {
    pub fn exited(stdout: impl Into<String>, elapsed_ms: u32, peak_memory_mb: u32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            termination: TerminationReason::Exited,
            elapsed_ms,
            peak_memory_mb,
        }
    }

    pub fn terminated(termination: TerminationReason, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            termination,
            elapsed_ms: 0,
            peak_memory_mb: 0,
        }
    }
}

/// Capability that actually runs submitted code.
///
/// Implementations own sandboxing, containers and resource accounting. The
/// pipeline bounds every call with a wall-clock timeout and drops the future
/// on cancellation, so implementations should release resources on drop.
#[async_trait]
pub trait ExecutionAdapter: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome, AdapterError>;
}
