use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ContestId, ProblemId, UserId};

/// Contest phase. Always derived from the clock, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestStatus {
    Upcoming,
    Ongoing,
    Finished,
}

/// A problem's point value inside one contest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestProblem {
    pub problem_id: ProblemId,
    pub score: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contest {
    pub id: ContestId,
    pub name: String,
    pub description: String,
    /// Inclusive.
    pub start_time: DateTime<Utc>,
    /// Exclusive.
    pub end_time: DateTime<Utc>,
    pub problems: Vec<ContestProblem>,
    pub participants: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Contest {
    pub fn status_at(&self, now: DateTime<Utc>) -> ContestStatus {
        if now < self.start_time {
            ContestStatus::Upcoming
        } else if now < self.end_time {
            ContestStatus::Ongoing
        } else {
            ContestStatus::Finished
        }
    }

    /// Whether `t` falls inside `[start_time, end_time)`.
    pub fn in_window(&self, t: DateTime<Utc>) -> bool {
        self.status_at(t) == ContestStatus::Ongoing
    }

    pub fn contains_problem(&self, problem_id: &ProblemId) -> bool {
        self.points_for(problem_id).is_some()
    }

    /// Contest-specific point value of a problem.
    pub fn points_for(&self, problem_id: &ProblemId) -> Option<u32> {
        self.problems
            .iter()
            .find(|p| &p.problem_id == problem_id)
            .map(|p| p.score)
    }

    pub fn total_points(&self) -> u32 {
        self.problems.iter().map(|p| p.score).sum()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}
