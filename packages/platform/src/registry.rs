//! Submission registry: records, lifecycle state machine and evaluation history.
//!
//! Lifecycle of a submission:
//!
//! ```text
//! Pending -> Judging -> Accepted | WrongAnswer | TimeLimitExceeded
//!                       | MemoryLimitExceeded | RuntimeError | CompileError
//! ```
//!
//! A re-judge starts from the terminal status. The status keeps the previous
//! verdict while `rejudging` is set and moves to the new verdict when the
//! evaluation is appended.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::judge_job::JudgeJob;
use common::judge_result::JudgeResult;
use common::submission::{Evaluation, EvaluationKind, Submission};
use common::user::UserStats;
use common::{ProblemId, SubmissionId, SubmissionStatus, UserId};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::PlatformError;
use crate::models::submission::SubmissionRecord;

/// Outcome of appending an evaluation.
#[derive(Debug, Clone)]
pub struct Completion {
    pub record: SubmissionRecord,
    /// Result of the evaluation this one supersedes.
    pub previous: Option<JudgeResult>,
}

#[derive(Default)]
pub struct SubmissionRegistry {
    records: DashMap<SubmissionId, Arc<Mutex<SubmissionRecord>>>,
    by_user: DashMap<UserId, Vec<SubmissionId>>,
    by_problem: DashMap<ProblemId, Vec<SubmissionId>>,
}

impl SubmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: &SubmissionId) -> Result<Arc<Mutex<SubmissionRecord>>, PlatformError> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| PlatformError::NotFound(format!("Submission {id} not found")))
    }

    /// Register a new submission in `Pending`.
    pub fn insert(&self, submission: Submission) -> Result<SubmissionRecord, PlatformError> {
        let id = submission.id.clone();
        let user_id = submission.user_id.clone();
        let problem_id = submission.problem_id.clone();
        let record = SubmissionRecord::new(submission);

        match self.records.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(PlatformError::Conflict(format!(
                    "Submission {id} already exists"
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(record.clone())));
            }
        }
        self.by_user.entry(user_id).or_default().push(id.clone());
        self.by_problem.entry(problem_id).or_default().push(id);
        Ok(record)
    }

    pub async fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, PlatformError> {
        let entry = self.entry(id)?;
        let record = entry.lock().await;
        Ok(record.clone())
    }

    /// Mark the start of a judging pass and return the submission to judge.
    pub async fn begin(
        &self,
        id: &SubmissionId,
        kind: EvaluationKind,
    ) -> Result<Submission, PlatformError> {
        let entry = self.entry(id)?;
        let mut record = entry.lock().await;
        match kind {
            EvaluationKind::Initial if record.status == SubmissionStatus::Pending => {
                record.status = SubmissionStatus::Judging;
            }
            EvaluationKind::Rejudge if record.rejudging && record.status.is_final() => {}
            _ => {
                return Err(PlatformError::Conflict(format!(
                    "Submission {id} cannot start a {kind:?} pass from {}",
                    record.status
                )));
            }
        }
        debug!(submission_id = %id, ?kind, "Judging pass started");
        Ok(record.submission.clone())
    }

    /// Request another judging pass.
    ///
    /// A judged submission gets a re-judge. A submission left `Pending` by a
    /// cancelled first pass gets its first pass again.
    pub async fn request_rejudge(&self, id: &SubmissionId) -> Result<EvaluationKind, PlatformError> {
        let entry = self.entry(id)?;
        let mut record = entry.lock().await;
        if record.status.is_final() && !record.rejudging {
            record.rejudging = true;
            return Ok(EvaluationKind::Rejudge);
        }
        if record.status == SubmissionStatus::Pending && record.evaluations.is_empty() {
            return Ok(EvaluationKind::Initial);
        }
        Err(PlatformError::Conflict(format!(
            "Submission {id} is already being judged"
        )))
    }

    /// Append the evaluation produced by `job` and move to its verdict.
    pub async fn complete(
        &self,
        job: &JudgeJob,
        result: JudgeResult,
        judged_at: DateTime<Utc>,
    ) -> Result<Completion, PlatformError> {
        let id = &job.submission_id;
        let entry = self.entry(id)?;
        let mut record = entry.lock().await;

        let expected = match job.kind {
            EvaluationKind::Initial => record.status == SubmissionStatus::Judging,
            EvaluationKind::Rejudge => record.rejudging,
        };
        if !expected {
            return Err(PlatformError::Conflict(format!(
                "Submission {id} has no {:?} pass in progress",
                job.kind
            )));
        }

        let previous = record.latest_result().cloned();
        let sequence = record.evaluations.len() as u32 + 1;
        record.status = result.verdict.into();
        record.rejudging = false;
        record.evaluations.push(Evaluation {
            sequence,
            kind: job.kind,
            job_id: job.job_id.clone(),
            result,
            judged_at,
        });

        info!(
            submission_id = %id,
            sequence,
            status = %record.status,
            "Evaluation recorded"
        );
        Ok(Completion {
            record: record.clone(),
            previous,
        })
    }

    /// Undo [`begin`](Self::begin) or a rejudge request after a pass was discarded.
    pub async fn abandon(&self, id: &SubmissionId, kind: EvaluationKind) -> Result<(), PlatformError> {
        let entry = self.entry(id)?;
        let mut record = entry.lock().await;
        match kind {
            EvaluationKind::Initial => {
                if !record.status.is_final() {
                    record.status = SubmissionStatus::Pending;
                }
            }
            EvaluationKind::Rejudge => record.rejudging = false,
        }
        debug!(submission_id = %id, status = %record.status, "Judging pass abandoned");
        Ok(())
    }

    async fn collect(&self, ids: Vec<SubmissionId>) -> Vec<SubmissionRecord> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Ok(record) = self.get(&id).await {
                records.push(record);
            }
        }
        records
    }

    pub fn has_user_submissions(&self, user_id: &UserId) -> bool {
        self.by_user.get(user_id).is_some_and(|ids| !ids.is_empty())
    }

    /// Submissions of a user, oldest first.
    pub async fn by_user(&self, user_id: &UserId) -> Vec<SubmissionRecord> {
        let ids = self
            .by_user
            .get(user_id)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();
        self.collect(ids).await
    }

    /// Submissions to a problem, oldest first.
    pub async fn by_problem(&self, problem_id: &ProblemId) -> Vec<SubmissionRecord> {
        let ids = self
            .by_problem
            .get(problem_id)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();
        self.collect(ids).await
    }

    /// Solved problems and submission count, derived from the records.
    pub async fn user_stats(&self, user_id: &UserId) -> UserStats {
        let records = self.by_user(user_id).await;
        let solved: HashSet<&ProblemId> = records
            .iter()
            .filter(|r| r.status.is_accepted())
            .map(|r| &r.submission.problem_id)
            .collect();
        UserStats {
            solved_problems: solved.len(),
            total_submissions: records.len(),
        }
    }
}
