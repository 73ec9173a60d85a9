use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::contest::{Contest, ContestProblem, ContestStatus};
use common::validation::{validate_name, validate_unique_ids};
use common::{ContestId, ProblemId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContestRequest {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<ContestId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Ordered `(problem_id, score)` pairs.
    pub problems: Vec<ContestProblem>,
}

impl CreateContestRequest {
    pub fn new(
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        problems: impl IntoIterator<Item = (&'static str, u32)>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            start_time,
            end_time,
            problems: problems
                .into_iter()
                .map(|(problem_id, score)| ContestProblem {
                    problem_id: problem_id.into(),
                    score,
                })
                .collect(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ContestId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn into_contest(self, id: ContestId, now: DateTime<Utc>) -> Contest {
        Contest {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            problems: self.problems,
            participants: BTreeSet::new(),
            created_at: now,
        }
    }
}

pub fn validate_create_contest(req: &CreateContestRequest) -> Result<(), PlatformError> {
    validate_name(&req.name, "Name")?;
    if req.start_time >= req.end_time {
        return Err(PlatformError::Validation(
            "start_time must be before end_time".into(),
        ));
    }
    if req.problems.is_empty() {
        return Err(PlatformError::Validation(
            "A contest needs at least one problem".into(),
        ));
    }
    validate_unique_ids(req.problems.iter().map(|p| &p.problem_id), "problem")?;
    for p in &req.problems {
        if !(1..=10_000).contains(&p.score) {
            return Err(PlatformError::Validation(format!(
                "Problem {}: contest score must be 1-10000",
                p.problem_id
            )));
        }
    }
    Ok(())
}

/// Status snapshot of a contest at a given instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestSummary {
    pub id: ContestId,
    pub name: String,
    pub status: ContestStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub problem_count: usize,
    pub participant_count: usize,
    pub total_points: u32,
}

impl ContestSummary {
    pub fn of(contest: &Contest, now: DateTime<Utc>) -> Self {
        Self {
            id: contest.id.clone(),
            name: contest.name.clone(),
            status: contest.status_at(now),
            start_time: contest.start_time,
            end_time: contest.end_time,
            problem_count: contest.problems.len(),
            participant_count: contest.participant_count(),
            total_points: contest.total_points(),
        }
    }
}

/// Per-problem cell of a leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemStanding {
    pub problem_id: ProblemId,
    /// Best contest-weighted score.
    pub best_score: u32,
    /// Counted submissions for this problem.
    pub attempts: u32,
    /// Earliest submission reaching `best_score`, when it is above zero.
    pub best_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based and unique.
    pub rank: usize,
    pub user_id: UserId,
    pub total_score: u32,
    /// When the participant reached `total_score`. `None` for a zero total.
    pub reached_at: Option<DateTime<Utc>>,
    /// In contest problem order.
    pub problems: Vec<ProblemStanding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub contest_id: ContestId,
    pub status: ContestStatus,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn entry(&self, user_id: &UserId) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| &e.user_id == user_id)
    }
}
