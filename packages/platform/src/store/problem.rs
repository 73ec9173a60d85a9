use std::sync::Arc;

use common::ProblemId;
use common::problem::Problem;
use dashmap::{DashMap, DashSet};
use dashmap::mapref::entry::Entry;

use crate::error::PlatformError;

/// Test case store: problems and their ordered test cases.
///
/// Records are immutable snapshots. An update builds a new revision and
/// swaps it in, so a judging pass keeps the revision it started with.
/// Ids of deleted problems are retired and never handed out again.
#[derive(Default)]
pub struct ProblemStore {
    problems: DashMap<ProblemId, Arc<Problem>>,
    retired: DashSet<ProblemId>,
}

impl ProblemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, problem: Problem) -> Result<Arc<Problem>, PlatformError> {
        match self.problems.entry(problem.id.clone()) {
            Entry::Occupied(_) => Err(PlatformError::Conflict(format!(
                "Problem {} already exists",
                problem.id
            ))),
            Entry::Vacant(_) if self.retired.contains(&problem.id) => {
                Err(PlatformError::Conflict(format!(
                    "Problem {} was deleted and its id cannot be reused",
                    problem.id
                )))
            }
            Entry::Vacant(slot) => {
                let problem = Arc::new(problem);
                slot.insert(problem.clone());
                Ok(problem)
            }
        }
    }

    pub fn get(&self, id: &ProblemId) -> Option<Arc<Problem>> {
        self.problems.get(id).map(|p| p.value().clone())
    }

    /// Look up a problem, returning `NotFound` if it does not exist.
    pub fn require(&self, id: &ProblemId) -> Result<Arc<Problem>, PlatformError> {
        self.get(id)
            .ok_or_else(|| PlatformError::NotFound(format!("Problem {id} not found")))
    }

    pub fn contains(&self, id: &ProblemId) -> bool {
        self.problems.contains_key(id)
    }

    /// Apply `f` to a copy of the problem and store the result. The entry
    /// stays locked while `f` runs.
    pub fn update<F>(&self, id: &ProblemId, f: F) -> Result<Arc<Problem>, PlatformError>
    where
        F: FnOnce(&mut Problem) -> Result<(), PlatformError>,
    {
        let mut entry = self
            .problems
            .get_mut(id)
            .ok_or_else(|| PlatformError::NotFound(format!("Problem {id} not found")))?;
        let mut next = Problem::clone(entry.value());
        f(&mut next)?;
        let next = Arc::new(next);
        *entry.value_mut() = next.clone();
        Ok(next)
    }

    pub fn remove(&self, id: &ProblemId) -> Result<Arc<Problem>, PlatformError> {
        // Retired under the shard lock, so a racing insert of the same id
        // either lands first or sees the tombstone.
        let removed = self.problems.remove_if(id, |_, _| {
            self.retired.insert(id.clone());
            true
        });
        removed
            .map(|(_, p)| p)
            .ok_or_else(|| PlatformError::NotFound(format!("Problem {id} not found")))
    }

    /// All problems ordered by id.
    pub fn list(&self) -> Vec<Arc<Problem>> {
        let mut problems: Vec<_> = self.problems.iter().map(|p| p.value().clone()).collect();
        problems.sort_by(|a, b| a.id.cmp(&b.id));
        problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}
