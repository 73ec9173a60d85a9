use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{ProblemId, SubmissionId};
use crate::submission::EvaluationKind;

/// A judge job placed on the dispatcher queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JudgeJob {
    /// Job identifier (UUID), unique per judging pass.
    pub job_id: String,
    /// ID of the submission being judged.
    pub submission_id: SubmissionId,
    /// ID of the problem, resolved to the current revision when the job runs.
    pub problem_id: ProblemId,
    /// First pass or re-judge.
    pub kind: EvaluationKind,
    pub enqueued_at: DateTime<Utc>,
}

impl JudgeJob {
    /// Create a new judge job with a generated UUID.
    pub fn new(
        submission_id: SubmissionId,
        problem_id: ProblemId,
        kind: EvaluationKind,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            submission_id,
            problem_id,
            kind,
            enqueued_at,
        }
    }
}
