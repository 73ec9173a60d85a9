use common::judge_job::JudgeJob;
use common::submission::{EvaluationKind, Submission};
use common::{ContestId, ProblemId, SubmissionId, UserId};
use tracing::{info, instrument, warn};

use crate::Platform;
use crate::dispatcher::SubmissionTicket;
use crate::error::PlatformError;
use crate::models::submission::*;

impl Platform {
    /// Register a submission and queue its first judging pass.
    ///
    /// Contest submissions made outside the contest window are accepted and
    /// judged but do not count for the leaderboard.
    #[instrument(
        skip(self, req),
        fields(user_id = %req.user_id, problem_id = %req.problem_id, language = %req.language)
    )]
    pub async fn submit(&self, req: SubmitRequest) -> Result<SubmissionTicket, PlatformError> {
        validate_submit(&req)?;
        self.check_submission_refs(&req.user_id, &req.problem_id, req.contest_id.as_ref())?;

        let now = self.now();
        let submission = Submission {
            id: SubmissionId::generate(),
            problem_id: req.problem_id,
            user_id: req.user_id,
            contest_id: req.contest_id,
            language: req.language.trim().to_string(),
            source: req.source,
            created_at: now,
        };
        let job = JudgeJob::new(
            submission.id.clone(),
            submission.problem_id.clone(),
            EvaluationKind::Initial,
            now,
        );

        // Waiting for queue room happens outside the lock. The references
        // are checked again once it is held, since a delete may have run.
        let claim = self.dispatcher.claim(job).await?;
        let record = {
            let _authoring = self.authoring();
            self.check_submission_refs(
                &submission.user_id,
                &submission.problem_id,
                submission.contest_id.as_ref(),
            )?;
            self.state.submissions.insert(submission)?
        };
        self.state.aggregation.record_submitted();
        let ticket = self.dispatcher.enqueue(claim)?;

        info!(submission_id = %record.submission.id, "Submission accepted");
        Ok(ticket)
    }

    /// The user must exist and be enabled, the problem must exist, and a
    /// contest, if named, must include the problem.
    fn check_submission_refs(
        &self,
        user_id: &UserId,
        problem_id: &ProblemId,
        contest_id: Option<&ContestId>,
    ) -> Result<(), PlatformError> {
        let user = self.state.users.require(user_id)?;
        if !user.enabled {
            return Err(PlatformError::Validation(format!(
                "User {user_id} is disabled"
            )));
        }
        self.state.problems.require(problem_id)?;
        if let Some(contest_id) = contest_id {
            let contest = self.state.contests.require(contest_id)?;
            if !contest.contains_problem(problem_id) {
                return Err(PlatformError::Validation(format!(
                    "Problem {problem_id} is not part of contest {contest_id}"
                )));
            }
        }
        Ok(())
    }

    /// Queue another judging pass for a submission.
    ///
    /// A judged submission gets a re-judge that appends a new evaluation.
    /// A submission whose first pass was cancelled gets that pass again.
    #[instrument(skip(self), fields(submission_id = %id))]
    pub async fn rejudge(&self, id: &SubmissionId) -> Result<SubmissionTicket, PlatformError> {
        let record = self.state.submissions.get(id).await?;
        let problem_id = record.submission.problem_id.clone();
        self.state.problems.require(&problem_id)?;

        let kind = if record.status.is_final() {
            EvaluationKind::Rejudge
        } else {
            EvaluationKind::Initial
        };
        let claim = self
            .dispatcher
            .claim(JudgeJob::new(id.clone(), problem_id, kind, self.now()))
            .await?;

        let granted = self.state.submissions.request_rejudge(id).await?;
        if granted != kind {
            warn!(expected = ?kind, ?granted, "Submission changed state while queueing");
            if granted == EvaluationKind::Rejudge {
                self.state.submissions.abandon(id, granted).await?;
            }
            return Err(PlatformError::Conflict(format!(
                "Submission {id} changed state, try again"
            )));
        }

        let ticket = self.dispatcher.enqueue(claim)?;
        info!(?kind, "Re-judge queued");
        Ok(ticket)
    }

    /// Cancel the queued or running pass of a submission. The submission
    /// keeps its last evaluation, or returns to `Pending` if it had none.
    #[instrument(skip(self), fields(submission_id = %id))]
    pub async fn cancel(&self, id: &SubmissionId) -> Result<(), PlatformError> {
        self.state.submissions.get(id).await?;
        if self.dispatcher.cancel(id) {
            Ok(())
        } else {
            Err(PlatformError::Conflict(format!(
                "Submission {id} is not queued or being judged"
            )))
        }
    }

    pub async fn submission(&self, id: &SubmissionId) -> Result<SubmissionRecord, PlatformError> {
        self.state.submissions.get(id).await
    }

    /// Submissions of a user, oldest first.
    pub async fn submissions_by_user(&self, user_id: &UserId) -> Vec<SubmissionRecord> {
        self.state.submissions.by_user(user_id).await
    }

    /// Submissions to a problem, oldest first.
    pub async fn submissions_by_problem(&self, problem_id: &ProblemId) -> Vec<SubmissionRecord> {
        self.state.submissions.by_problem(problem_id).await
    }
}
