//! Authoring rules shared by every surface that builds a [`Problem`].

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use thiserror::Error;

use crate::problem::{ExpectedOutput, Problem, TestCase};

/// A malformed problem, test case, contest or user definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type Result<T = ()> = std::result::Result<T, ValidationError>;

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result {
    validate_name(title, "Title")
}

/// Validate a trimmed display name (1-256 Unicode characters).
pub fn validate_name(value: &str, field: &str) -> Result {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > 256 {
        return Err(ValidationError(format!("{field} must be 1-256 characters")));
    }
    Ok(())
}

/// Validate a time limit in milliseconds (1-30000).
pub fn validate_time_limit(ms: u32) -> Result {
    if !(1..=30_000).contains(&ms) {
        return Err(ValidationError::new("Time limit must be 1-30000 ms"));
    }
    Ok(())
}

/// Validate a memory limit in megabytes (1-4096).
pub fn validate_memory_limit(mb: u32) -> Result {
    if !(1..=4096).contains(&mb) {
        return Err(ValidationError::new("Memory limit must be 1-4096 MB"));
    }
    Ok(())
}

/// Validate a score value (0-10000).
pub fn validate_score(score: u32) -> Result {
    if score > 10_000 {
        return Err(ValidationError::new("Score must be 0-10000"));
    }
    Ok(())
}

/// Reject duplicate ids in an ordered list.
pub fn validate_unique_ids<'a, T>(ids: impl IntoIterator<Item = &'a T>, name: &str) -> Result
where
    T: Eq + Hash + Display + 'a,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError(format!("Duplicate {name} {id}")));
        }
    }
    Ok(())
}

/// A problem needs at least one scored case, and every scored case must be
/// worth at least one point.
pub fn validate_test_cases(test_cases: &[TestCase]) -> Result {
    if !test_cases.iter().any(|tc| tc.include_in_scoring) {
        return Err(ValidationError::new(
            "At least one test case must be included in scoring",
        ));
    }
    validate_unique_ids(test_cases.iter().map(|tc| &tc.id), "test case")?;

    for tc in test_cases {
        let id = &tc.id;
        if id.as_str().trim().is_empty() {
            return Err(ValidationError::new("Test case id must not be empty"));
        }
        validate_score(tc.weight)?;
        if tc.include_in_scoring && tc.weight == 0 {
            return Err(ValidationError(format!(
                "Test case {id}: scored test cases must have a weight of at least 1"
            )));
        }
        if let Some(tl) = tc.time_limit_ms {
            validate_time_limit(tl)?;
        }
        if let Some(ml) = tc.memory_limit_mb {
            validate_memory_limit(ml)?;
        }
        if let ExpectedOutput::Reference { language, source } = &tc.expected
            && (language.trim().is_empty() || source.trim().is_empty())
        {
            return Err(ValidationError(format!(
                "Test case {id}: reference solution needs a language and source"
            )));
        }
    }
    Ok(())
}

/// Everything a problem must satisfy before it can be judged.
pub fn validate_problem(problem: &Problem) -> Result {
    validate_title(&problem.title)?;
    validate_time_limit(problem.time_limit_ms)?;
    validate_memory_limit(problem.memory_limit_mb)?;
    validate_test_cases(&problem.test_cases)
}
