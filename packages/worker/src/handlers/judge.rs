use std::path::Path;

use chrono::Utc;
use common::judge_result::JudgeResult;
use common::problem::{
    ComparisonPolicy, Difficulty, ExpectedOutput, Problem, SampleTestCase, TestCase,
};
use common::submission::Submission;
use common::validation::validate_problem;
use common::SubmissionId;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::error::{JudgeError, Result, WorkerError};
use crate::models::judge::JudgePipeline;

/// Problem definition as written in a local TOML file.
#[derive(Debug, Deserialize)]
pub struct ProblemFile {
    pub id: String,
    pub title: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: u32,
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u32,
    #[serde(default)]
    pub comparison: ComparisonPolicy,
    #[serde(default)]
    pub samples: Vec<SampleTestCase>,
    pub test_cases: Vec<TestCaseFile>,
}

#[derive(Debug, Deserialize)]
pub struct TestCaseFile {
    pub id: Option<String>,
    #[serde(default)]
    pub input: String,
    pub output: Option<String>,
    pub reference_language: Option<String>,
    pub reference_source: Option<String>,
    pub time_limit_ms: Option<u32>,
    pub memory_limit_mb: Option<u32>,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default = "default_include_in_scoring")]
    pub include_in_scoring: bool,
}

fn default_difficulty() -> Difficulty {
    Difficulty::Easy
}
fn default_time_limit_ms() -> u32 {
    1000
}
fn default_memory_limit_mb() -> u32 {
    256
}
fn default_weight() -> u32 {
    100
}
fn default_include_in_scoring() -> bool {
    true
}

impl ProblemFile {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn into_problem(self) -> Result<Problem> {
        if self.test_cases.is_empty() {
            return Err(WorkerError::ProblemFile("no test cases".into()));
        }

        let test_cases = self
            .test_cases
            .into_iter()
            .enumerate()
            .map(|(index, tc)| {
                let id = tc.id.unwrap_or_else(|| (index + 1).to_string());
                let expected = match (tc.output, tc.reference_language, tc.reference_source) {
                    (Some(output), None, None) => ExpectedOutput::Literal { output },
                    (None, Some(language), Some(source)) => {
                        ExpectedOutput::Reference { language, source }
                    }
                    _ => {
                        return Err(WorkerError::ProblemFile(format!(
                            "test case {id}: set either `output` or both `reference_language` and `reference_source`"
                        )));
                    }
                };
                Ok(TestCase {
                    id: id.into(),
                    input: tc.input,
                    expected,
                    time_limit_ms: tc.time_limit_ms,
                    memory_limit_mb: tc.memory_limit_mb,
                    weight: tc.weight,
                    include_in_scoring: tc.include_in_scoring,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let now = Utc::now();
        let problem = Problem {
            id: self.id.into(),
            title: self.title,
            difficulty: self.difficulty,
            description: self.description,
            input_description: String::new(),
            output_description: String::new(),
            constraints: Vec::new(),
            samples: self.samples,
            time_limit_ms: self.time_limit_ms,
            memory_limit_mb: self.memory_limit_mb,
            comparison: self.comparison,
            test_cases,
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        validate_problem(&problem).map_err(|err| WorkerError::ProblemFile(err.to_string()))?;
        Ok(problem)
    }
}

/// Judge a local source file against a problem outside of any platform.
#[instrument(skip(pipeline, problem, source), fields(problem_id = %problem.id))]
pub async fn judge_local(
    pipeline: &JudgePipeline,
    problem: &Problem,
    language: &str,
    source: String,
) -> std::result::Result<JudgeResult, JudgeError> {
    let submission = Submission {
        id: SubmissionId::generate(),
        problem_id: problem.id.clone(),
        user_id: "local".into(),
        contest_id: None,
        language: language.to_string(),
        source,
        created_at: Utc::now(),
    };
    info!(submission_id = %submission.id, "Judging local submission");

    pipeline
        .judge(&submission, problem, &CancellationToken::new())
        .await
}
