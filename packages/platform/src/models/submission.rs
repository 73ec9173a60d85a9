use common::judge_result::{JudgeResult, JudgeSystemErrorInfo, TestCaseJudgeResult};
use common::submission::{Evaluation, Submission};
use common::{ContestId, ProblemId, SubmissionStatus, UserId, Verdict};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Largest accepted source file.
pub const MAX_SOURCE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub user_id: UserId,
    pub problem_id: ProblemId,
    #[serde(default)]
    pub contest_id: Option<ContestId>,
    pub language: String,
    pub source: String,
}

impl SubmitRequest {
    pub fn new(
        user_id: impl Into<UserId>,
        problem_id: impl Into<ProblemId>,
        language: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            problem_id: problem_id.into(),
            contest_id: None,
            language: language.into(),
            source: source.into(),
        }
    }

    pub fn in_contest(mut self, contest_id: impl Into<ContestId>) -> Self {
        self.contest_id = Some(contest_id.into());
        self
    }
}

pub fn validate_submit(req: &SubmitRequest) -> Result<(), PlatformError> {
    if req.language.trim().is_empty() {
        return Err(PlatformError::Validation("Language is required".into()));
    }
    if req.source.trim().is_empty() {
        return Err(PlatformError::Validation("Source cannot be empty".into()));
    }
    if req.source.len() > MAX_SOURCE_BYTES {
        return Err(PlatformError::Validation(format!(
            "Source exceeds {MAX_SOURCE_BYTES} bytes"
        )));
    }
    Ok(())
}

/// A submission with its lifecycle state and evaluation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub submission: Submission,
    pub status: SubmissionStatus,
    /// A re-judge is queued or running. The status keeps the last verdict
    /// until it completes.
    pub rejudging: bool,
    /// Oldest first. Never edited, only appended.
    pub evaluations: Vec<Evaluation>,
}

impl SubmissionRecord {
    pub fn new(submission: Submission) -> Self {
        Self {
            submission,
            status: SubmissionStatus::Pending,
            rejudging: false,
            evaluations: Vec::new(),
        }
    }

    pub fn latest(&self) -> Option<&Evaluation> {
        self.evaluations.last()
    }

    pub fn latest_result(&self) -> Option<&JudgeResult> {
        self.latest().map(|e| &e.result)
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.status.verdict()
    }

    /// Score of the latest evaluation, `None` before the first one.
    pub fn score(&self) -> Option<u32> {
        self.latest_result().map(|r| r.score)
    }

    pub fn test_case_results(&self) -> &[TestCaseJudgeResult] {
        self.latest_result()
            .map(|r| r.test_case_results.as_slice())
            .unwrap_or_default()
    }

    /// Infrastructure diagnostic of the latest evaluation, if any.
    pub fn diagnostic(&self) -> Option<&JudgeSystemErrorInfo> {
        self.latest_result().and_then(|r| r.error_info.as_ref())
    }
}
