use common::judge_job::JudgeJob;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use worker::JudgeError;

use crate::error::PlatformError;
use crate::models::submission::SubmissionRecord;
use crate::registry::Completion;
use crate::state::AppState;

fn cancelled(job: &JudgeJob) -> PlatformError {
    PlatformError::Conflict(format!(
        "Judging of submission {} was cancelled",
        job.submission_id
    ))
}

/// Run one judging pass and record its evaluation.
///
/// The problem is resolved when the job starts, so the pass judges the
/// revision current at that moment. A cancelled pass leaves no evaluation
/// behind.
#[instrument(skip_all, fields(submission_id = %job.submission_id, job_id = %job.job_id, kind = ?job.kind))]
pub async fn process_job(
    state: &AppState,
    job: &JudgeJob,
    cancel: &CancellationToken,
) -> Result<SubmissionRecord, PlatformError> {
    if cancel.is_cancelled() {
        state.submissions.abandon(&job.submission_id, job.kind).await?;
        return Err(cancelled(job));
    }

    let submission = state.submissions.begin(&job.submission_id, job.kind).await?;

    let problem = match state.problems.require(&job.problem_id) {
        Ok(problem) => problem,
        Err(e) => {
            warn!(problem_id = %job.problem_id, "Problem disappeared before judging");
            state.submissions.abandon(&job.submission_id, job.kind).await?;
            return Err(e);
        }
    };

    let result = match state.pipeline.judge(&submission, &problem, cancel).await {
        Ok(result) => result,
        Err(JudgeError::Cancelled) => {
            state.submissions.abandon(&job.submission_id, job.kind).await?;
            return Err(cancelled(job));
        }
    };

    let completion = state
        .submissions
        .complete(job, result, state.clock.now())
        .await?;
    record_aggregates(state, &completion).await;

    info!(
        status = %completion.record.status,
        score = ?completion.record.score(),
        "Processed judge job"
    );
    Ok(completion.record)
}

async fn record_aggregates(state: &AppState, completion: &Completion) {
    let record = &completion.record;
    let Some(evaluation) = record.latest() else {
        return;
    };

    state.aggregation.record_verdict(
        completion.previous.as_ref().map(|previous| previous.verdict),
        evaluation.result.verdict,
    );
    state
        .aggregation
        .record_problem(
            &record.submission.problem_id,
            completion.previous.as_ref(),
            &evaluation.result,
        )
        .await;

    if let Some(contest_id) = &record.submission.contest_id
        && let Some(contest) = state.contests.get(contest_id)
    {
        state
            .aggregation
            .record_contest(&contest, &record.submission, evaluation)
            .await;
    }
}
