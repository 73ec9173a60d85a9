use common::ProblemId;
use common::contest::ContestStatus;
use common::user::Role;

use crate::Platform;
use crate::error::PlatformError;
use crate::models::stats::{PlatformOverview, ProblemStats};

impl Platform {
    /// Acceptance counters of a problem. Reads the running totals kept by
    /// the aggregation engine; nothing is recomputed.
    pub async fn problem_stats(&self, id: &ProblemId) -> Result<ProblemStats, PlatformError> {
        self.state.problems.require(id)?;
        Ok(self.state.aggregation.problem_stats(id).await)
    }

    /// Stats of every problem, ordered by problem id.
    pub async fn list_problem_stats(&self) -> Vec<ProblemStats> {
        let mut stats = Vec::new();
        for problem in self.state.problems.list() {
            stats.push(self.state.aggregation.problem_stats(&problem.id).await);
        }
        stats
    }

    /// Platform-wide totals. Submission and verdict counts come from the
    /// aggregation engine's running counters.
    pub fn overview(&self) -> PlatformOverview {
        let now = self.now();
        let users = self.state.users.list();
        let count_role = |role| users.iter().filter(|u| u.role == role).count() as u64;

        PlatformOverview {
            users: users.len() as u64,
            students: count_role(Role::Student),
            instructors: count_role(Role::Instructor),
            admins: count_role(Role::Admin),
            enabled_users: users.iter().filter(|u| u.enabled).count() as u64,
            problems: self.state.problems.len() as u64,
            contests: self.state.contests.len() as u64,
            active_contests: self
                .state
                .contests
                .list()
                .iter()
                .filter(|c| c.status_at(now) == ContestStatus::Ongoing)
                .count() as u64,
            submissions: self.state.aggregation.submitted(),
            verdicts: self.state.aggregation.verdict_counts(),
        }
    }
}
