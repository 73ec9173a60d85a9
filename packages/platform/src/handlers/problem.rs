use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::ProblemId;
use common::contest::ContestStatus;
use common::problem::Problem;
use tracing::{info, instrument};

use super::generated_id;
use crate::Platform;
use crate::error::PlatformError;
use crate::models::problem::*;

impl Platform {
    #[instrument(skip(self, req), fields(title = %req.title))]
    pub fn create_problem(&self, req: CreateProblemRequest) -> Result<Arc<Problem>, PlatformError> {
        validate_create_problem(&req)?;

        let id = req
            .id
            .clone()
            .unwrap_or_else(|| ProblemId::new(generated_id("p")));
        let problem = req.into_problem(id, self.now())?;
        let problem = self.state.problems.insert(problem)?;

        info!(
            problem_id = %problem.id,
            test_cases = problem.test_cases.len(),
            max_score = problem.max_score(),
            "Problem created"
        );
        Ok(problem)
    }

    /// Update a problem. Time limits, memory limits and test cases are
    /// locked once any contest using the problem has started.
    #[instrument(skip(self, req), fields(problem_id = %id))]
    pub fn update_problem(
        &self,
        id: &ProblemId,
        req: UpdateProblemRequest,
    ) -> Result<Arc<Problem>, PlatformError> {
        validate_update_problem(&req)?;

        let now = self.now();
        let touches_judging = req.touches_judging();
        let _authoring = touches_judging.then(|| self.authoring());
        let problem = self.state.problems.update(id, |problem| {
            if touches_judging {
                self.ensure_judging_editable(&problem.id, now)?;
            }
            req.apply(problem, now)
        })?;

        if touches_judging {
            self.state.pipeline.forget_problem(id);
        }
        info!(revision = problem.revision, "Problem updated");
        Ok(problem)
    }

    /// Replace the whole ordered test case list.
    pub fn replace_test_cases(
        &self,
        id: &ProblemId,
        test_cases: Vec<TestCaseRequest>,
    ) -> Result<Arc<Problem>, PlatformError> {
        self.update_problem(
            id,
            UpdateProblemRequest {
                test_cases: Some(test_cases),
                ..Default::default()
            },
        )
    }

    /// Delete a problem. Rejected while a contest using it has not finished.
    ///
    /// The id is retired: it cannot name a new problem, and evaluations
    /// that finish after the delete are not counted anywhere.
    #[instrument(skip(self), fields(problem_id = %id))]
    pub fn delete_problem(&self, id: &ProblemId) -> Result<(), PlatformError> {
        let _authoring = self.authoring();
        self.state.problems.require(id)?;
        if let Some(contest) =
            self.state
                .contests
                .blocking(id, self.now(), &[ContestStatus::Finished])
        {
            return Err(PlatformError::Conflict(format!(
                "Problem {id} is used by contest {} which has not finished",
                contest.id
            )));
        }

        self.state.problems.remove(id)?;
        self.state.pipeline.forget_problem(id);
        self.state.aggregation.forget_problem(id);
        info!("Problem deleted");
        Ok(())
    }

    pub fn problem(&self, id: &ProblemId) -> Result<Arc<Problem>, PlatformError> {
        self.state.problems.require(id)
    }

    /// All problems ordered by id.
    pub fn problems(&self) -> Vec<Arc<Problem>> {
        self.state.problems.list()
    }

    fn ensure_judging_editable(
        &self,
        id: &ProblemId,
        now: DateTime<Utc>,
    ) -> Result<(), PlatformError> {
        match self
            .state
            .contests
            .blocking(id, now, &[ContestStatus::Upcoming])
        {
            Some(contest) => Err(PlatformError::Conflict(format!(
                "Test cases of problem {id} are locked: contest {} has started",
                contest.id
            ))),
            None => Ok(()),
        }
    }
}
