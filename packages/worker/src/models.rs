pub mod adapter;
pub mod comparator;
pub mod judge;
pub mod scoring;

pub use adapter::error::AdapterError;
pub use adapter::local::LocalProcessAdapter;
pub use adapter::{ExecutionAdapter, ExecutionOutcome, ExecutionRequest, TerminationReason};
pub use comparator::{Comparison, compare};
pub use judge::JudgePipeline;
pub use scoring::{BinaryScoring, ScoringPolicy};
