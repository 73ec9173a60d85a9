use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome of one test case, or of a whole submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Verdict {
    Accepted,
    /// Ran to completion but printed the wrong thing.
    WrongAnswer,
    /// Over the CPU limit or the wall-clock bound.
    TimeLimitExceeded,
    MemoryLimitExceeded,
    /// Crashed, non-zero exit, or the judge itself failed.
    RuntimeError,
    CompileError,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }

    /// Two or three letter abbreviation used in compact reports.
    pub fn code(self) -> &'static str {
        match self {
            Self::Accepted => "AC",
            Self::WrongAnswer => "WA",
            Self::TimeLimitExceeded => "TLE",
            Self::MemoryLimitExceeded => "MLE",
            Self::RuntimeError => "RE",
            Self::CompileError => "CE",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "WrongAnswer",
            Self::TimeLimitExceeded => "TimeLimitExceeded",
            Self::MemoryLimitExceeded => "MemoryLimitExceeded",
            Self::RuntimeError => "RuntimeError",
            Self::CompileError => "CompileError",
        }
    }

    pub const ALL: [Verdict; 6] = [
        Self::Accepted,
        Self::WrongAnswer,
        Self::TimeLimitExceeded,
        Self::MemoryLimitExceeded,
        Self::RuntimeError,
        Self::CompileError,
    ];
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a submission is in its lifecycle.
///
/// A status is either transient (`Pending`, `Judging`) or a terminal
/// [`Verdict`]. A rejudge keeps the terminal status until the new verdict
/// replaces it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Judging,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompileError,
}

impl SubmissionStatus {
    pub fn is_final(&self) -> bool {
        self.verdict().is_some()
    }

    pub fn is_accepted(&self) -> bool {
        *self == Self::Accepted
    }

    pub fn verdict(&self) -> Option<Verdict> {
        Some(match self {
            Self::Pending | Self::Judging => return None,
            Self::Accepted => Verdict::Accepted,
            Self::WrongAnswer => Verdict::WrongAnswer,
            Self::TimeLimitExceeded => Verdict::TimeLimitExceeded,
            Self::MemoryLimitExceeded => Verdict::MemoryLimitExceeded,
            Self::RuntimeError => Verdict::RuntimeError,
            Self::CompileError => Verdict::CompileError,
        })
    }
}

impl From<Verdict> for SubmissionStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accepted => Self::Accepted,
            Verdict::WrongAnswer => Self::WrongAnswer,
            Verdict::TimeLimitExceeded => Self::TimeLimitExceeded,
            Verdict::MemoryLimitExceeded => Self::MemoryLimitExceeded,
            Verdict::RuntimeError => Self::RuntimeError,
            Verdict::CompileError => Self::CompileError,
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.verdict()) {
            (_, Some(verdict)) => verdict.fmt(f),
            (Self::Judging, None) => f.write_str("Judging"),
            _ => f.write_str("Pending"),
        }
    }
}

/// Returned when a string names no known status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status '{}'", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for Verdict {
    type Err = ParseStatusError;

    /// Accepts the full name or the short code, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s) || v.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

impl FromStr for SubmissionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pending") {
            Ok(Self::Pending)
        } else if s.eq_ignore_ascii_case("judging") {
            Ok(Self::Judging)
        } else {
            s.parse::<Verdict>().map(Self::from)
        }
    }
}
