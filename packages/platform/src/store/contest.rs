use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::contest::{Contest, ContestStatus};
use common::{ContestId, ProblemId, UserId};
use dashmap::{DashMap, DashSet};
use dashmap::mapref::entry::Entry;

use crate::error::PlatformError;

#[derive(Default)]
pub struct ContestStore {
    contests: DashMap<ContestId, Arc<Contest>>,
    /// Deleted ids. A new contest may not take one over.
    retired: DashSet<ContestId>,
}

impl ContestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, contest: Contest) -> Result<Arc<Contest>, PlatformError> {
        match self.contests.entry(contest.id.clone()) {
            Entry::Occupied(_) => Err(PlatformError::Conflict(format!(
                "Contest {} already exists",
                contest.id
            ))),
            Entry::Vacant(_) if self.retired.contains(&contest.id) => {
                Err(PlatformError::Conflict(format!(
                    "Contest {} was deleted and its id cannot be reused",
                    contest.id
                )))
            }
            Entry::Vacant(slot) => {
                let contest = Arc::new(contest);
                slot.insert(contest.clone());
                Ok(contest)
            }
        }
    }

    pub fn get(&self, id: &ContestId) -> Option<Arc<Contest>> {
        self.contests.get(id).map(|c| c.value().clone())
    }

    /// Look up a contest, returning `NotFound` if it does not exist.
    pub fn require(&self, id: &ContestId) -> Result<Arc<Contest>, PlatformError> {
        self.get(id)
            .ok_or_else(|| PlatformError::NotFound(format!("Contest {id} not found")))
    }

    /// Add `user_id` to the participant set. Returns `false` if already registered.
    pub fn register(&self, id: &ContestId, user_id: &UserId) -> Result<bool, PlatformError> {
        let mut entry = self
            .contests
            .get_mut(id)
            .ok_or_else(|| PlatformError::NotFound(format!("Contest {id} not found")))?;
        if entry.participants.contains(user_id) {
            return Ok(false);
        }
        let mut next = Contest::clone(entry.value());
        next.participants.insert(user_id.clone());
        *entry.value_mut() = Arc::new(next);
        Ok(true)
    }

    pub fn remove(&self, id: &ContestId) -> Result<Arc<Contest>, PlatformError> {
        self.contests
            .remove_if(id, |_, _| {
                self.retired.insert(id.clone());
                true
            })
            .map(|(_, c)| c)
            .ok_or_else(|| PlatformError::NotFound(format!("Contest {id} not found")))
    }

    /// Drop `user_id` from every participant set.
    pub fn unregister_everywhere(&self, user_id: &UserId) {
        for mut entry in self.contests.iter_mut() {
            if entry.participants.contains(user_id) {
                let mut next = Contest::clone(entry.value());
                next.participants.remove(user_id);
                *entry.value_mut() = Arc::new(next);
            }
        }
    }

    /// Contests that include `problem_id`, ordered by id.
    pub fn referencing(&self, problem_id: &ProblemId) -> Vec<Arc<Contest>> {
        let mut contests: Vec<_> = self
            .contests
            .iter()
            .filter(|c| c.contains_problem(problem_id))
            .map(|c| c.value().clone())
            .collect();
        contests.sort_by(|a, b| a.id.cmp(&b.id));
        contests
    }

    /// First contest including `problem_id` that is not in `allowed` at `now`.
    pub fn blocking(
        &self,
        problem_id: &ProblemId,
        now: DateTime<Utc>,
        allowed: &[ContestStatus],
    ) -> Option<Arc<Contest>> {
        self.referencing(problem_id)
            .into_iter()
            .find(|c| !allowed.contains(&c.status_at(now)))
    }

    /// All contests ordered by start time, then id.
    pub fn len(&self) -> usize {
        self.contests.len()
    }

    pub fn list(&self) -> Vec<Arc<Contest>> {
        let mut contests: Vec<_> = self.contests.iter().map(|c| c.value().clone()).collect();
        contests.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        contests
    }
}
