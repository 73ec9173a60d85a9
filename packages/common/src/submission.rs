use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ContestId, ProblemId, SubmissionId, UserId};
use crate::judge_result::JudgeResult;

/// Immutable facts of a submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub problem_id: ProblemId,
    pub user_id: UserId,
    pub contest_id: Option<ContestId>,
    pub language: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
    Initial,
    Rejudge,
}

/// One completed judging pass. Evaluations are append-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Evaluation {
    /// 1-based position in the submission's history.
    pub sequence: u32,
    pub kind: EvaluationKind,
    pub job_id: String,
    pub result: JudgeResult,
    pub judged_at: DateTime<Utc>,
}
