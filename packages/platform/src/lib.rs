//! Submission evaluation and scoring core of the online judge.
//!
//! [`Platform`] owns the test case store, the submission registry, the
//! aggregation engine and the judge dispatcher. Operations are grouped by
//! entity under [`handlers`].

pub mod aggregation;
pub mod clock;
pub mod config;
pub mod consumers;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod seed;
pub mod state;
pub mod store;

use std::sync::{Arc, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::info;
use worker::{ExecutionAdapter, JudgePipeline};

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{DispatcherConfig, PlatformConfig};
pub use crate::dispatcher::SubmissionTicket;
pub use crate::error::{PlatformError, Result};

use crate::dispatcher::Dispatcher;
use crate::state::AppState;

pub struct Platform {
    state: Arc<AppState>,
    dispatcher: Dispatcher,
}

impl Platform {
    /// Build the stores and start the judge workers on the current runtime.
    pub fn start(
        config: PlatformConfig,
        adapter: Arc<dyn ExecutionAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let pipeline = JudgePipeline::new(adapter, config.judge.clone());
        let state = Arc::new(AppState::new(pipeline, clock));
        let dispatcher = Dispatcher::start(state.clone(), &config.dispatcher);
        info!("Platform started");
        Self { state, dispatcher }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.state.clock.now()
    }

    fn authoring(&self) -> MutexGuard<'_, ()> {
        self.state
            .authoring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop the judge workers. Passes in flight are cancelled and queued
    /// passes are dropped; records and aggregates stay readable.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }
}
