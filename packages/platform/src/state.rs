use std::sync::{Arc, Mutex};

use worker::JudgePipeline;

use crate::aggregation::AggregationEngine;
use crate::clock::Clock;
use crate::registry::SubmissionRegistry;
use crate::store::{ContestStore, ProblemStore, UserStore};

/// Everything the platform operations and the judge workers share.
pub struct AppState {
    pub problems: ProblemStore,
    pub contests: ContestStore,
    pub users: UserStore,
    pub submissions: SubmissionRegistry,
    pub aggregation: AggregationEngine,
    pub pipeline: JudgePipeline,
    pub clock: Arc<dyn Clock>,
    /// Held while an operation checks references between users, problems,
    /// contests and submissions and then writes based on that check.
    pub authoring: Mutex<()>,
}

impl AppState {
    pub fn new(pipeline: JudgePipeline, clock: Arc<dyn Clock>) -> Self {
        Self {
            problems: ProblemStore::new(),
            contests: ContestStore::new(),
            users: UserStore::new(),
            submissions: SubmissionRegistry::new(),
            aggregation: AggregationEngine::new(),
            pipeline,
            clock,
            authoring: Mutex::new(()),
        }
    }
}
