use common::ProblemId;
use common::submission_status::Verdict;
use serde::{Deserialize, Serialize};

/// Acceptance counters of one problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemStats {
    pub problem_id: ProblemId,
    /// Submissions with at least one completed evaluation.
    pub judged: u64,
    /// Judged submissions whose latest verdict is `Accepted`.
    pub accepted: u64,
}

impl ProblemStats {
    pub fn new(problem_id: ProblemId) -> Self {
        Self {
            problem_id,
            judged: 0,
            accepted: 0,
        }
    }

    /// `accepted / judged`, or 0 before anything was judged.
    pub fn acceptance_rate(&self) -> f64 {
        if self.judged == 0 {
            0.0
        } else {
            self.accepted as f64 / self.judged as f64
        }
    }
}

/// Number of submissions whose latest verdict is `verdict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCount {
    pub verdict: Verdict,
    pub count: u64,
}

/// Platform-wide totals for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformOverview {
    pub users: u64,
    pub students: u64,
    pub instructors: u64,
    pub admins: u64,
    /// Accounts that can sign in and submit.
    pub enabled_users: u64,
    pub problems: u64,
    pub contests: u64,
    /// Contests currently `Ongoing`.
    pub active_contests: u64,
    pub submissions: u64,
    pub verdicts: Vec<VerdictCount>,
}
