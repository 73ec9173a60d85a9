use chrono::{DateTime, Utc};
use common::problem::{
    ComparisonPolicy, Difficulty, ExpectedOutput, Problem, SampleTestCase, TestCase,
};
use common::validation::{self, validate_memory_limit, validate_time_limit, validate_title};
use common::{ProblemId, TestCaseId};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSolution {
    pub language: String,
    pub source: String,
}

/// A test case as submitted by an author. Exactly one of `expected_output`
/// and `reference` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseRequest {
    /// Defaults to the 1-based position in the list.
    #[serde(default)]
    pub id: Option<TestCaseId>,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub reference: Option<ReferenceSolution>,
    #[serde(default)]
    pub time_limit_ms: Option<u32>,
    #[serde(default)]
    pub memory_limit_mb: Option<u32>,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default = "default_include_in_scoring")]
    pub include_in_scoring: bool,
}

fn default_weight() -> u32 {
    100
}
fn default_include_in_scoring() -> bool {
    true
}

impl TestCaseRequest {
    pub fn literal(input: impl Into<String>, output: impl Into<String>, weight: u32) -> Self {
        Self {
            id: None,
            input: input.into(),
            expected_output: Some(output.into()),
            reference: None,
            time_limit_ms: None,
            memory_limit_mb: None,
            weight,
            include_in_scoring: true,
        }
    }

    pub fn reference(
        input: impl Into<String>,
        language: impl Into<String>,
        source: impl Into<String>,
        weight: u32,
    ) -> Self {
        Self {
            id: None,
            input: input.into(),
            expected_output: None,
            reference: Some(ReferenceSolution {
                language: language.into(),
                source: source.into(),
            }),
            time_limit_ms: None,
            memory_limit_mb: None,
            weight,
            include_in_scoring: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<TestCaseId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Run the case without counting it towards the score.
    pub fn unscored(mut self) -> Self {
        self.include_in_scoring = false;
        self
    }

    fn into_test_case(self, index: usize) -> Result<TestCase, PlatformError> {
        let id = self
            .id
            .unwrap_or_else(|| TestCaseId::new((index + 1).to_string()));
        let expected = match (self.expected_output, self.reference) {
            (Some(output), None) => ExpectedOutput::Literal { output },
            (None, Some(ReferenceSolution { language, source })) => {
                ExpectedOutput::Reference { language, source }
            }
            (Some(_), Some(_)) => {
                return Err(PlatformError::Validation(format!(
                    "Test case {id}: expected output and reference solution are mutually exclusive"
                )));
            }
            (None, None) => {
                return Err(PlatformError::Validation(format!(
                    "Test case {id}: an expected output or a reference solution is required"
                )));
            }
        };
        Ok(TestCase {
            id,
            input: self.input,
            expected,
            time_limit_ms: self.time_limit_ms,
            memory_limit_mb: self.memory_limit_mb,
            weight: self.weight,
            include_in_scoring: self.include_in_scoring,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProblemRequest {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<ProblemId>,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_description: String,
    #[serde(default)]
    pub output_description: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub samples: Vec<SampleTestCase>,
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
    #[serde(default)]
    pub comparison: ComparisonPolicy,
    pub test_cases: Vec<TestCaseRequest>,
}

impl CreateProblemRequest {
    /// Request with a 1000 ms / 256 MB limit and the default comparison.
    pub fn new(
        title: impl Into<String>,
        difficulty: Difficulty,
        test_cases: Vec<TestCaseRequest>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            difficulty,
            description: String::new(),
            input_description: String::new(),
            output_description: String::new(),
            constraints: Vec::new(),
            samples: Vec::new(),
            time_limit_ms: 1000,
            memory_limit_mb: 256,
            comparison: ComparisonPolicy::default(),
            test_cases,
        }
    }

    pub fn with_id(mut self, id: impl Into<ProblemId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Build the stored problem. Call [`validate_create_problem`] first.
    pub fn into_problem(self, id: ProblemId, now: DateTime<Utc>) -> Result<Problem, PlatformError> {
        Ok(Problem {
            id,
            title: self.title.trim().to_string(),
            difficulty: self.difficulty,
            description: self.description,
            input_description: self.input_description,
            output_description: self.output_description,
            constraints: self.constraints,
            samples: self.samples,
            time_limit_ms: self.time_limit_ms,
            memory_limit_mb: self.memory_limit_mb,
            comparison: self.comparison,
            test_cases: build_test_cases(self.test_cases)?,
            revision: 1,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update. Absent fields are left unchanged. The comparison policy
/// is fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProblemRequest {
    pub title: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub description: Option<String>,
    pub input_description: Option<String>,
    pub output_description: Option<String>,
    pub constraints: Option<Vec<String>>,
    pub samples: Option<Vec<SampleTestCase>>,
    pub time_limit_ms: Option<u32>,
    pub memory_limit_mb: Option<u32>,
    pub test_cases: Option<Vec<TestCaseRequest>>,
}

impl UpdateProblemRequest {
    /// Whether applying this update can change how submissions are judged.
    pub fn touches_judging(&self) -> bool {
        self.time_limit_ms.is_some() || self.memory_limit_mb.is_some() || self.test_cases.is_some()
    }

    /// Apply to `problem` and bump its revision. Call
    /// [`validate_update_problem`] first.
    pub fn apply(self, problem: &mut Problem, now: DateTime<Utc>) -> Result<(), PlatformError> {
        if let Some(test_cases) = self.test_cases {
            problem.test_cases = build_test_cases(test_cases)?;
        }
        if let Some(title) = self.title {
            problem.title = title.trim().to_string();
        }
        if let Some(difficulty) = self.difficulty {
            problem.difficulty = difficulty;
        }
        if let Some(description) = self.description {
            problem.description = description;
        }
        if let Some(input_description) = self.input_description {
            problem.input_description = input_description;
        }
        if let Some(output_description) = self.output_description {
            problem.output_description = output_description;
        }
        if let Some(constraints) = self.constraints {
            problem.constraints = constraints;
        }
        if let Some(samples) = self.samples {
            problem.samples = samples;
        }
        if let Some(tl) = self.time_limit_ms {
            problem.time_limit_ms = tl;
        }
        if let Some(ml) = self.memory_limit_mb {
            problem.memory_limit_mb = ml;
        }
        problem.revision += 1;
        problem.updated_at = now;
        Ok(())
    }
}

fn build_test_cases(requests: Vec<TestCaseRequest>) -> Result<Vec<TestCase>, PlatformError> {
    requests
        .into_iter()
        .enumerate()
        .map(|(index, req)| req.into_test_case(index))
        .collect()
}

pub fn validate_create_problem(req: &CreateProblemRequest) -> Result<(), PlatformError> {
    validate_title(&req.title)?;
    validate_time_limit(req.time_limit_ms)?;
    validate_memory_limit(req.memory_limit_mb)?;
    validate_test_cases(&req.test_cases)
}

pub fn validate_update_problem(req: &UpdateProblemRequest) -> Result<(), PlatformError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(tl) = req.time_limit_ms {
        validate_time_limit(tl)?;
    }
    if let Some(ml) = req.memory_limit_mb {
        validate_memory_limit(ml)?;
    }
    if let Some(ref test_cases) = req.test_cases {
        validate_test_cases(test_cases)?;
    }
    Ok(())
}

/// Resolve each request into a test case and run the shared authoring rules.
pub fn validate_test_cases(test_cases: &[TestCaseRequest]) -> Result<(), PlatformError> {
    let built = build_test_cases(test_cases.to_vec())?;
    validation::validate_test_cases(&built)?;
    Ok(())
}
