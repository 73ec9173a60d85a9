//! Worker pool draining a FIFO queue of judge jobs.
//!
//! Submissions are judged in parallel, one pass per worker. Each queued pass
//! owns a cancellation token derived from the pool's shutdown token, so both
//! a targeted cancel and shutdown reach the pass in flight.

use std::sync::Arc;

use common::SubmissionId;
use common::judge_job::JudgeJob;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::DispatcherConfig;
use crate::consumers::process_job;
use crate::error::PlatformError;
use crate::models::submission::SubmissionRecord;
use crate::state::AppState;

type Reply = oneshot::Sender<Result<SubmissionRecord, PlatformError>>;

struct QueuedJob {
    job: JudgeJob,
    cancel: CancellationToken,
    reply: Reply,
}

/// Pass currently queued or running for a submission.
struct ActivePass {
    job_id: String,
    cancel: CancellationToken,
}

/// Resolves once the submission's queued pass finishes.
#[derive(Debug)]
pub struct SubmissionTicket {
    pub submission_id: SubmissionId,
    receiver: oneshot::Receiver<Result<SubmissionRecord, PlatformError>>,
}

impl SubmissionTicket {
    /// Wait for the pass. Returns the record in its terminal status, or why
    /// the pass produced no evaluation.
    pub async fn wait(self) -> Result<SubmissionRecord, PlatformError> {
        self.receiver.await.unwrap_or_else(|_| {
            Err(PlatformError::Unavailable(format!(
                "Dispatcher shut down before submission {} was judged",
                self.submission_id
            )))
        })
    }
}

/// A claimed queue slot. Dropping it without [`Dispatcher::enqueue`]
/// releases the claim.
pub struct Claim<'a> {
    dispatcher: &'a Dispatcher,
    job: Option<JudgeJob>,
    permit: Option<mpsc::Permit<'a, QueuedJob>>,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            self.dispatcher.release(&job.submission_id, &job.job_id);
        }
    }
}

pub struct Dispatcher {
    sender: mpsc::Sender<QueuedJob>,
    active: Arc<DashMap<SubmissionId, ActivePass>>,
    shutdown: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Spawn `config.workers` workers on the current runtime.
    pub fn start(state: Arc<AppState>, config: &DispatcherConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let active = Arc::new(DashMap::new());
        let shutdown = CancellationToken::new();

        let workers = (0..config.workers.max(1))
            .map(|index| {
                tokio::spawn(run_worker(
                    index,
                    state.clone(),
                    receiver.clone(),
                    active.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();

        info!(
            workers = config.workers.max(1),
            queue_capacity = config.queue_capacity.max(1),
            "Judge dispatcher started"
        );

        Self {
            sender,
            active,
            shutdown,
            workers: Mutex::new(workers),
        }
    }

    /// Reserve a queue slot for `job` and mark its submission active.
    ///
    /// Waits while the queue is full. Fails with `Conflict` if the
    /// submission already has a pass queued or running, and with
    /// `Unavailable` after shutdown.
    pub async fn claim(&self, job: JudgeJob) -> Result<Claim<'_>, PlatformError> {
        if self.shutdown.is_cancelled() {
            return Err(unavailable());
        }

        match self.active.entry(job.submission_id.clone()) {
            Entry::Occupied(_) => {
                return Err(PlatformError::Conflict(format!(
                    "Submission {} is already queued for judging",
                    job.submission_id
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(ActivePass {
                    job_id: job.job_id.clone(),
                    cancel: self.shutdown.child_token(),
                });
            }
        }

        let mut claim = Claim {
            dispatcher: self,
            job: Some(job),
            permit: None,
        };
        let permit = tokio::select! {
            permit = self.sender.reserve() => permit.map_err(|_| unavailable())?,
            _ = self.shutdown.cancelled() => return Err(unavailable()),
        };
        claim.permit = Some(permit);
        Ok(claim)
    }

    /// Put a claimed job on the queue.
    #[instrument(skip_all)]
    pub fn enqueue(&self, mut claim: Claim<'_>) -> Result<SubmissionTicket, PlatformError> {
        if self.shutdown.is_cancelled() {
            return Err(unavailable());
        }
        let (Some(job), Some(permit)) = (claim.job.take(), claim.permit.take()) else {
            return Err(unavailable());
        };

        let Some(cancel) = self
            .active
            .get(&job.submission_id)
            .filter(|pass| pass.job_id == job.job_id)
            .map(|pass| pass.cancel.clone())
        else {
            return Err(unavailable());
        };

        let (reply, receiver) = oneshot::channel();
        let submission_id = job.submission_id.clone();
        debug!(
            submission_id = %job.submission_id,
            job_id = %job.job_id,
            kind = ?job.kind,
            "Judge job queued"
        );
        permit.send(QueuedJob { job, cancel, reply });

        Ok(SubmissionTicket {
            submission_id,
            receiver,
        })
    }

    /// Cancel the queued or running pass of a submission. Returns `false`
    /// when there is none.
    pub fn cancel(&self, submission_id: &SubmissionId) -> bool {
        match self.active.get(submission_id) {
            Some(pass) => {
                pass.cancel.cancel();
                info!(submission_id = %submission_id, job_id = %pass.job_id, "Judging cancelled");
                true
            }
            None => false,
        }
    }

    fn release(&self, submission_id: &SubmissionId, job_id: &str) {
        self.active
            .remove_if(submission_id, |_, pass| pass.job_id == job_id);
    }

    /// Stop accepting work, cancel passes in flight and wait for the
    /// workers. Jobs still queued are dropped; their tickets resolve with
    /// `Unavailable`.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let workers = std::mem::take(&mut *self.workers.lock().await);
        let count = workers.len();
        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                warn!(error = %e, "Judge worker ended abnormally");
            }
        }
        self.active.clear();
        info!(workers = count, "Judge dispatcher stopped");
    }
}

fn unavailable() -> PlatformError {
    PlatformError::Unavailable("Judging is shutting down".into())
}

async fn run_worker(
    index: usize,
    state: Arc<AppState>,
    receiver: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    active: Arc<DashMap<SubmissionId, ActivePass>>,
    shutdown: CancellationToken,
) {
    debug!(worker = index, "Judge worker started");
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = async { receiver.lock().await.recv().await } => next,
        };
        let Some(QueuedJob { job, cancel, reply }) = next else {
            break;
        };

        let outcome = process_job(&state, &job, &cancel).await;
        let outcome = match outcome {
            Err(PlatformError::Conflict(_)) if shutdown.is_cancelled() => Err(unavailable()),
            other => other,
        };
        if let Err(ref e) = outcome {
            debug!(worker = index, submission_id = %job.submission_id, error = %e, "Judge job ended without evaluation");
        }

        active.remove_if(&job.submission_id, |_, pass| pass.job_id == job.job_id);
        // The submitter may have dropped its ticket.
        let _ = reply.send(outcome);
    }
    debug!(worker = index, "Judge worker stopped");
}
