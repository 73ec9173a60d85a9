//! Judging pipeline.
//!
//! Runs every test case of a submission through the execution adapter in
//! order, classifies each run, and folds the case results into an overall
//! verdict and score.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use common::judge_result::{JudgeResult, JudgeSystemErrorInfo, TestCaseJudgeResult};
use common::problem::{ExpectedOutput, Problem, TestCase};
use common::retry::{RetryDecision, RetryPolicy, RetryTracker};
use common::submission::Submission;
use common::{JudgeSettings, ProblemId, TestCaseId, Verdict};
use dashmap::DashMap;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::JudgeError;
use crate::models::adapter::{
    ExecutionAdapter, ExecutionOutcome, ExecutionRequest, TerminationReason,
};
use crate::models::comparator::compare;
use crate::models::scoring::{BinaryScoring, ScoringPolicy, awarded};

/// Expected outputs produced by reference solutions, keyed by problem
/// revision so that authoring updates never see stale output.
type ReferenceKey = (ProblemId, u64, TestCaseId);

pub struct JudgePipeline {
    adapter: Arc<dyn ExecutionAdapter>,
    scoring: Arc<dyn ScoringPolicy>,
    settings: JudgeSettings,
    reference_outputs: DashMap<ReferenceKey, Arc<str>>,
}

/// Result of one bounded adapter call, after retries.
enum Invocation {
    Completed(ExecutionOutcome),
    /// The wall-clock bound elapsed and the call was dropped.
    TimedOut,
    Failed(JudgeSystemErrorInfo),
}

enum Classification {
    CompileFailure,
    Verdict(Verdict),
    NeedsComparison,
}

enum CaseRun {
    Judged {
        result: TestCaseJudgeResult,
        diagnostic: Option<JudgeSystemErrorInfo>,
    },
    CompileFailed(String),
}

impl JudgePipeline {
    pub fn new(adapter: Arc<dyn ExecutionAdapter>, settings: JudgeSettings) -> Self {
        Self::with_scoring(adapter, settings, Arc::new(BinaryScoring))
    }

    pub fn with_scoring(
        adapter: Arc<dyn ExecutionAdapter>,
        settings: JudgeSettings,
        scoring: Arc<dyn ScoringPolicy>,
    ) -> Self {
        Self {
            adapter,
            scoring,
            settings,
            reference_outputs: DashMap::new(),
        }
    }

    /// Drop cached reference outputs of a problem.
    pub fn forget_problem(&self, problem_id: &ProblemId) {
        self.reference_outputs
            .retain(|(cached, _, _), _| cached != problem_id);
    }

    /// Judge `submission` against every test case of `problem`.
    ///
    /// Returns [`JudgeError::Cancelled`] when `cancel` fires; the partial pass
    /// is discarded.
    #[instrument(skip_all, fields(submission_id = %submission.id, problem_id = %problem.id))]
    pub async fn judge(
        &self,
        submission: &Submission,
        problem: &Problem,
        cancel: &CancellationToken,
    ) -> Result<JudgeResult, JudgeError> {
        let mut results = Vec::with_capacity(problem.test_cases.len());
        let mut error_info = None;

        for case in &problem.test_cases {
            if cancel.is_cancelled() {
                info!("Judging cancelled before test case {}", case.id);
                return Err(JudgeError::Cancelled);
            }

            match self.run_case(submission, problem, case, cancel).await? {
                CaseRun::Judged { result, diagnostic } => {
                    debug!(
                        test_case_id = %case.id,
                        verdict = %result.verdict,
                        score = result.score,
                        "Test case judged"
                    );
                    if error_info.is_none() {
                        error_info = diagnostic;
                    }
                    results.push(result);
                }
                CaseRun::CompileFailed(output) => {
                    info!("Compilation failed");
                    return Ok(self.compile_error(submission, problem, output));
                }
            }
        }

        let result = fold(submission, problem, results, error_info);
        info!(
            verdict = %result.verdict,
            score = result.score,
            max_score = result.max_score,
            "Judging finished"
        );
        Ok(result)
    }

    async fn run_case(
        &self,
        submission: &Submission,
        problem: &Problem,
        case: &TestCase,
        cancel: &CancellationToken,
    ) -> Result<CaseRun, JudgeError> {
        let time_limit_ms = problem.time_limit_for(case);
        let memory_limit_mb = problem.memory_limit_for(case);

        let expected = match self.expected_output(problem, case, cancel).await? {
            Ok(expected) => expected,
            Err(info) => return Ok(self.infrastructure_failure(case, info)),
        };

        let request = ExecutionRequest {
            language: submission.language.clone(),
            source: submission.source.clone(),
            stdin: case.input.clone(),
            time_limit_ms,
            memory_limit_mb,
        };

        let outcome = match self.invoke(&request, cancel).await? {
            Invocation::Completed(outcome) => outcome,
            Invocation::TimedOut => {
                warn!(test_case_id = %case.id, "Adapter call exceeded the wall-clock bound");
                let verdict = Verdict::TimeLimitExceeded;
                return Ok(CaseRun::Judged {
                    result: TestCaseJudgeResult {
                        test_case_id: case.id.clone(),
                        verdict,
                        score: awarded(self.scoring.as_ref(), case, verdict),
                        include_in_scoring: case.include_in_scoring,
                        time_used_ms: Some(time_limit_ms),
                        memory_used_mb: None,
                        stdout: None,
                        stderr: None,
                        note: None,
                    },
                    diagnostic: None,
                });
            }
            Invocation::Failed(info) => return Ok(self.infrastructure_failure(case, info)),
        };

        let verdict = match classify(&outcome, time_limit_ms, memory_limit_mb) {
            Classification::CompileFailure => return Ok(CaseRun::CompileFailed(outcome.stderr)),
            Classification::Verdict(verdict) => verdict,
            Classification::NeedsComparison => {
                if compare(&expected, &outcome.stdout, problem.comparison).is_match() {
                    Verdict::Accepted
                } else {
                    Verdict::WrongAnswer
                }
            }
        };

        Ok(CaseRun::Judged {
            result: TestCaseJudgeResult {
                test_case_id: case.id.clone(),
                verdict,
                score: awarded(self.scoring.as_ref(), case, verdict),
                include_in_scoring: case.include_in_scoring,
                time_used_ms: Some(outcome.elapsed_ms),
                memory_used_mb: Some(outcome.peak_memory_mb),
                stdout: self.excerpt(&outcome.stdout),
                stderr: self.excerpt(&outcome.stderr),
                note: None,
            },
            diagnostic: None,
        })
    }

    /// Resolve the expected output of `case`, running its reference solution
    /// when needed.
    async fn expected_output(
        &self,
        problem: &Problem,
        case: &TestCase,
        cancel: &CancellationToken,
    ) -> Result<Result<Arc<str>, JudgeSystemErrorInfo>, JudgeError> {
        let (language, source) = match &case.expected {
            ExpectedOutput::Literal { output } => return Ok(Ok(Arc::from(output.as_str()))),
            ExpectedOutput::Reference { language, source } => (language, source),
        };

        let key = (problem.id.clone(), problem.revision, case.id.clone());
        if let Some(cached) = self.reference_outputs.get(&key) {
            return Ok(Ok(cached.value().clone()));
        }

        debug!(test_case_id = %case.id, "Generating expected output from reference solution");
        let request = ExecutionRequest {
            language: language.clone(),
            source: source.clone(),
            stdin: case.input.clone(),
            time_limit_ms: problem.time_limit_for(case),
            memory_limit_mb: problem.memory_limit_for(case),
        };

        let failure = |detail: String| -> Result<Result<Arc<str>, JudgeSystemErrorInfo>, JudgeError> {
            warn!(test_case_id = %case.id, detail = %detail, "Reference solution failed");
            Ok(Err(JudgeSystemErrorInfo::new(
                JudgeSystemErrorInfo::REFERENCE_FAILED,
                format!("Reference solution for test case {} {detail}", case.id),
            )))
        };

        match self.invoke(&request, cancel).await? {
            Invocation::Completed(outcome) => {
                if outcome.termination != TerminationReason::Exited {
                    return failure(format!("terminated with {:?}", outcome.termination));
                }
                let output: Arc<str> = Arc::from(outcome.stdout);
                self.reference_outputs.retain(|(cached, revision, _), _| {
                    cached != &problem.id || *revision >= problem.revision
                });
                self.reference_outputs.insert(key, output.clone());
                Ok(Ok(output))
            }
            Invocation::TimedOut => failure("exceeded the wall-clock bound".into()),
            Invocation::Failed(info) => Ok(Err(info)),
        }
    }

    /// Call the adapter under the wall-clock bound, retrying while the
    /// environment reports itself unavailable.
    async fn invoke(
        &self,
        request: &ExecutionRequest,
        cancel: &CancellationToken,
    ) -> Result<Invocation, JudgeError> {
        let wall_clock = Duration::from_millis(
            (request.time_limit_ms as u64).saturating_add(self.settings.wall_clock_overhead_ms),
        );
        let mut retries = RetryTracker::new(RetryPolicy {
            max_retries: self.settings.adapter_max_retries,
            base_delay_ms: self.settings.retry_base_delay_ms,
            max_delay_ms: self.settings.retry_max_delay_ms,
        });

        loop {
            let call = AssertUnwindSafe(self.adapter.execute(request)).catch_unwind();
            let attempt = tokio::select! {
                _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
                attempt = tokio::time::timeout(wall_clock, call) => attempt,
            };

            let error = match attempt {
                Err(_) => return Ok(Invocation::TimedOut),
                Ok(Err(panic)) => {
                    let message = panic_message(panic.as_ref());
                    warn!(panic = %message, "Execution adapter panicked");
                    return Ok(Invocation::Failed(JudgeSystemErrorInfo::new(
                        JudgeSystemErrorInfo::ADAPTER_INTERNAL,
                        format!("adapter panicked: {message}"),
                    )));
                }
                Ok(Ok(Ok(outcome))) => return Ok(Invocation::Completed(outcome)),
                Ok(Ok(Err(error))) => error,
            };

            if !error.is_retryable() {
                warn!(error = %error, "Execution adapter failed");
                return Ok(Invocation::Failed(JudgeSystemErrorInfo::new(
                    JudgeSystemErrorInfo::ADAPTER_INTERNAL,
                    error.to_string(),
                )));
            }

            match retries.record_failure(error.to_string()) {
                RetryDecision::Retry { attempt, delay } => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Execution environment unavailable, retrying"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                RetryDecision::Exhausted { errors } => {
                    warn!(
                        retry_count = errors.len(),
                        error = %error,
                        "Max retries exhausted"
                    );
                    return Ok(Invocation::Failed(JudgeSystemErrorInfo::new(
                        JudgeSystemErrorInfo::ADAPTER_UNAVAILABLE,
                        format!(
                            "judging infrastructure unavailable after {} attempts, retry: {error}",
                            errors.len()
                        ),
                    )));
                }
            }
        }
    }

    fn infrastructure_failure(&self, case: &TestCase, info: JudgeSystemErrorInfo) -> CaseRun {
        CaseRun::Judged {
            result: TestCaseJudgeResult {
                test_case_id: case.id.clone(),
                verdict: Verdict::RuntimeError,
                score: 0,
                include_in_scoring: case.include_in_scoring,
                time_used_ms: None,
                memory_used_mb: None,
                stdout: None,
                stderr: None,
                note: Some(info.message.clone()),
            },
            diagnostic: Some(info),
        }
    }

    fn compile_error(&self, submission: &Submission, problem: &Problem, output: String) -> JudgeResult {
        let test_case_results = problem
            .test_cases
            .iter()
            .map(|case| TestCaseJudgeResult {
                test_case_id: case.id.clone(),
                verdict: Verdict::CompileError,
                score: 0,
                include_in_scoring: case.include_in_scoring,
                time_used_ms: None,
                memory_used_mb: None,
                stdout: None,
                stderr: None,
                note: None,
            })
            .collect();

        JudgeResult {
            submission_id: submission.id.clone(),
            verdict: Verdict::CompileError,
            score: 0,
            max_score: problem.max_score(),
            time_used_ms: None,
            memory_used_mb: None,
            compile_output: Some(output),
            error_info: None,
            test_case_results,
        }
    }

    fn excerpt(&self, s: &str) -> Option<String> {
        if s.is_empty() {
            return None;
        }
        let limit = self.settings.output_excerpt_bytes;
        if s.len() <= limit {
            return Some(s.to_string());
        }
        let mut end = limit;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        Some(s[..end].to_string())
    }
}

/// Termination reason first, then measured usage against the limits.
fn classify(outcome: &ExecutionOutcome, time_limit_ms: u32, memory_limit_mb: u32) -> Classification {
    match outcome.termination {
        TerminationReason::CompileFailure => Classification::CompileFailure,
        TerminationReason::TimeLimitExceeded => {
            Classification::Verdict(Verdict::TimeLimitExceeded)
        }
        _ if outcome.elapsed_ms > time_limit_ms => {
            Classification::Verdict(Verdict::TimeLimitExceeded)
        }
        TerminationReason::MemoryLimitExceeded => {
            Classification::Verdict(Verdict::MemoryLimitExceeded)
        }
        _ if outcome.peak_memory_mb > memory_limit_mb => {
            Classification::Verdict(Verdict::MemoryLimitExceeded)
        }
        TerminationReason::RuntimeFailure { .. } => Classification::Verdict(Verdict::RuntimeError),
        TerminationReason::Exited => Classification::NeedsComparison,
    }
}

fn fold(
    submission: &Submission,
    problem: &Problem,
    results: Vec<TestCaseJudgeResult>,
    error_info: Option<JudgeSystemErrorInfo>,
) -> JudgeResult {
    let verdict = results
        .iter()
        .map(|r| r.verdict)
        .find(|v| !v.is_accepted())
        .unwrap_or(Verdict::Accepted);
    let score = results
        .iter()
        .filter(|r| r.include_in_scoring)
        .map(|r| r.score)
        .sum();

    JudgeResult {
        submission_id: submission.id.clone(),
        verdict,
        score,
        max_score: problem.max_score(),
        time_used_ms: results.iter().filter_map(|r| r.time_used_ms).max(),
        memory_used_mb: results.iter().filter_map(|r| r.memory_used_mb).max(),
        compile_output: None,
        error_info,
        test_case_results: results,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
