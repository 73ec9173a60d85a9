use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ProblemId, TestCaseId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// How program output is compared against the expected output.
///
/// Fixed per problem at creation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPolicy {
    /// Byte-for-byte equality.
    Exact,
    /// Equality after stripping trailing whitespace per line and trailing blank lines.
    #[default]
    Trimmed,
    /// Equality of whitespace-separated token sequences.
    Tokenwise,
}

/// Where a test case's expected output comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExpectedOutput {
    /// Expected output written by the author.
    Literal { output: String },
    /// Expected output generated by running a reference solution on the input.
    Reference { language: String, source: String },
}

/// One judged unit of a problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: TestCaseId,
    pub input: String,
    pub expected: ExpectedOutput,
    /// Overrides the problem time limit when set.
    pub time_limit_ms: Option<u32>,
    /// Overrides the problem memory limit when set.
    pub memory_limit_mb: Option<u32>,
    /// Points awarded when this case is accepted.
    pub weight: u32,
    /// Cases excluded from scoring still run and still affect the verdict.
    pub include_in_scoring: bool,
}

impl TestCase {
    /// Weight counted towards the submission score.
    pub fn scored_weight(&self) -> u32 {
        if self.include_in_scoring {
            self.weight
        } else {
            0
        }
    }
}

/// Example shown to contestants. Never judged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleTestCase {
    pub input: String,
    pub output: String,
    pub explanation: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub input_description: String,
    pub output_description: String,
    pub constraints: Vec<String>,
    pub samples: Vec<SampleTestCase>,
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
    pub comparison: ComparisonPolicy,
    pub test_cases: Vec<TestCase>,
    /// Bumped on every authoring update.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    /// Sum of the weights of all scored test cases.
    pub fn max_score(&self) -> u32 {
        self.test_cases.iter().map(TestCase::scored_weight).sum()
    }

    pub fn time_limit_for(&self, case: &TestCase) -> u32 {
        case.time_limit_ms.unwrap_or(self.time_limit_ms)
    }

    pub fn memory_limit_for(&self, case: &TestCase) -> u32 {
        case.memory_limit_mb.unwrap_or(self.memory_limit_mb)
    }
}
