use std::sync::Arc;

use common::contest::{Contest, ContestStatus};
use common::{ContestId, UserId};
use tracing::{info, instrument};

use super::generated_id;
use crate::Platform;
use crate::error::PlatformError;
use crate::models::contest::*;

impl Platform {
    #[instrument(skip(self, req), fields(name = %req.name))]
    pub fn create_contest(&self, req: CreateContestRequest) -> Result<Arc<Contest>, PlatformError> {
        validate_create_contest(&req)?;
        let _authoring = self.authoring();
        for entry in &req.problems {
            if !self.state.problems.contains(&entry.problem_id) {
                return Err(PlatformError::Validation(format!(
                    "Problem {} does not exist",
                    entry.problem_id
                )));
            }
        }

        let id = req
            .id
            .clone()
            .unwrap_or_else(|| ContestId::new(generated_id("c")));
        let contest = self.state.contests.insert(req.into_contest(id, self.now()))?;

        info!(
            contest_id = %contest.id,
            problems = contest.problems.len(),
            start_time = %contest.start_time,
            end_time = %contest.end_time,
            "Contest created"
        );
        Ok(contest)
    }

    /// Register a participant. Returns `false` if already registered.
    #[instrument(skip(self), fields(contest_id = %contest_id, user_id = %user_id))]
    pub fn register_participant(
        &self,
        contest_id: &ContestId,
        user_id: &UserId,
    ) -> Result<bool, PlatformError> {
        let _authoring = self.authoring();
        let user = self.state.users.require(user_id)?;
        if !user.enabled {
            return Err(PlatformError::Validation(format!(
                "User {user_id} is disabled"
            )));
        }
        let contest = self.state.contests.require(contest_id)?;
        if contest.status_at(self.now()) == ContestStatus::Finished {
            return Err(PlatformError::Conflict(format!(
                "Contest {contest_id} has finished"
            )));
        }

        let added = self.state.contests.register(contest_id, user_id)?;
        if added {
            info!("Participant registered");
        }
        Ok(added)
    }

    /// Delete a contest that has not started or has finished. Its board is
    /// dropped and the id retired. Submissions made to it keep their records.
    #[instrument(skip(self), fields(contest_id = %id))]
    pub fn delete_contest(&self, id: &ContestId) -> Result<(), PlatformError> {
        let _authoring = self.authoring();
        let contest = self.state.contests.require(id)?;
        if contest.status_at(self.now()) == ContestStatus::Ongoing {
            return Err(PlatformError::Conflict(format!(
                "Contest {id} is running and cannot be deleted"
            )));
        }

        self.state.contests.remove(id)?;
        self.state.aggregation.forget_contest(id);
        info!("Contest deleted");
        Ok(())
    }

    pub fn contest(&self, id: &ContestId) -> Result<Arc<Contest>, PlatformError> {
        self.state.contests.require(id)
    }

    /// Status as of now.
    pub fn contest_status(&self, id: &ContestId) -> Result<ContestStatus, PlatformError> {
        Ok(self.state.contests.require(id)?.status_at(self.now()))
    }

    /// Contest summaries ordered by start time.
    pub fn contests(&self) -> Vec<ContestSummary> {
        let now = self.now();
        self.state
            .contests
            .list()
            .iter()
            .map(|contest| ContestSummary::of(contest, now))
            .collect()
    }

    /// Leaderboard as of now.
    pub async fn leaderboard(&self, id: &ContestId) -> Result<Leaderboard, PlatformError> {
        let contest = self.state.contests.require(id)?;
        Ok(self.state.aggregation.leaderboard(&contest, self.now()).await)
    }
}
