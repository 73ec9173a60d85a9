use serde::{Deserialize, Serialize};

use crate::Verdict;
use crate::ids::{SubmissionId, TestCaseId};

/// Structured diagnostic attached to a result when the judging
/// infrastructure, not the submitted program, caused the verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeSystemErrorInfo {
    /// Machine-readable error code (e.g., "ADAPTER_UNAVAILABLE").
    pub code: String,
    /// Human-readable error description.
    pub message: String,
}

impl JudgeSystemErrorInfo {
    /// The execution environment stayed unavailable after every retry.
    pub const ADAPTER_UNAVAILABLE: &'static str = "ADAPTER_UNAVAILABLE";
    /// The adapter failed in an unexpected way (error or panic).
    pub const ADAPTER_INTERNAL: &'static str = "ADAPTER_INTERNAL";
    /// A reference solution could not produce expected output.
    pub const REFERENCE_FAILED: &'static str = "REFERENCE_FAILED";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether the submitter should be told to retry later.
    pub fn is_retryable(&self) -> bool {
        self.code == Self::ADAPTER_UNAVAILABLE
    }
}

/// Outcome of one judging pass over a submission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JudgeResult {
    pub submission_id: SubmissionId,
    /// First non-accepted case verdict in test-case order, or `Accepted`.
    pub verdict: Verdict,
    /// Sum of awarded scores over scored test cases.
    pub score: u32,
    /// Problem maximum score at judging time.
    pub max_score: u32,
    /// Maximum time used across all test cases (milliseconds).
    pub time_used_ms: Option<u32>,
    /// Maximum memory used across all test cases (megabytes).
    pub memory_used_mb: Option<u32>,
    /// Compiler diagnostics when the verdict is `CompileError`.
    pub compile_output: Option<String>,
    /// First infrastructure diagnostic raised during the pass.
    pub error_info: Option<JudgeSystemErrorInfo>,
    /// Individual test case results, in test-case order.
    pub test_case_results: Vec<TestCaseJudgeResult>,
}

impl JudgeResult {
    pub fn passed_cases(&self) -> usize {
        self.test_case_results
            .iter()
            .filter(|r| r.verdict.is_accepted())
            .count()
    }
}

/// Result for a single test case execution.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TestCaseJudgeResult {
    pub test_case_id: TestCaseId,
    pub verdict: Verdict,
    /// Points earned for this test case (0 when not counted).
    pub score: u32,
    pub include_in_scoring: bool,
    /// Time used in milliseconds.
    pub time_used_ms: Option<u32>,
    /// Peak memory in megabytes.
    pub memory_used_mb: Option<u32>,
    /// Program stdout excerpt.
    pub stdout: Option<String>,
    /// Program stderr excerpt.
    pub stderr: Option<String>,
    /// Infrastructure note for this case.
    pub note: Option<String>,
}
