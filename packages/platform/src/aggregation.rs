//! Aggregation engine: per-problem acceptance counters and contest boards.
//!
//! Both are updated when an evaluation is recorded, each under its own
//! per-problem or per-contest lock, so reads never rescan submissions.
//! Platform-wide submission and verdict totals are kept alongside.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};
use common::contest::Contest;
use common::judge_result::JudgeResult;
use common::submission_status::Verdict;
use common::submission::{Evaluation, Submission};
use common::{ContestId, ProblemId, SubmissionId, UserId};
use dashmap::{DashMap, DashSet};
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::contest::{Leaderboard, LeaderboardEntry, ProblemStanding};
use crate::models::stats::{ProblemStats, VerdictCount};

/// Convert a problem score into contest points:
/// `floor(score * contest_points / problem_max_score)`.
pub fn contest_score(score: u32, max_score: u32, contest_points: u32) -> u32 {
    if max_score == 0 {
        return 0;
    }
    let points = u64::from(score.min(max_score)) * u64::from(contest_points) / u64::from(max_score);
    points as u32
}

/// Whether `submission` counts towards `contest`'s leaderboard.
pub fn counts_for(contest: &Contest, submission: &Submission) -> bool {
    submission.contest_id.as_ref() == Some(&contest.id)
        && contest.in_window(submission.created_at)
        && contest.contains_problem(&submission.problem_id)
}

#[derive(Debug, Clone, Copy)]
struct Attempt {
    /// Evaluation sequence the points come from.
    sequence: u32,
    points: u32,
    at: DateTime<Utc>,
}

/// Counted attempts of one contest, per participant and problem.
#[derive(Debug, Default)]
struct ContestBoard {
    cells: HashMap<(UserId, ProblemId), HashMap<SubmissionId, Attempt>>,
}

impl ContestBoard {
    fn standing(&self, user_id: &UserId, problem_id: &ProblemId) -> ProblemStanding {
        let key = (user_id.clone(), problem_id.clone());
        let mut standing = ProblemStanding {
            problem_id: problem_id.clone(),
            best_score: 0,
            attempts: 0,
            best_at: None,
        };
        let Some(attempts) = self.cells.get(&key) else {
            return standing;
        };

        standing.attempts = attempts.len() as u32;
        for attempt in attempts.values() {
            if attempt.points == 0 {
                continue;
            }
            let better = match standing.best_at {
                None => true,
                Some(at) => {
                    attempt.points > standing.best_score
                        || (attempt.points == standing.best_score && attempt.at < at)
                }
            };
            if better {
                standing.best_score = attempt.points;
                standing.best_at = Some(attempt.at);
            }
        }
        standing
    }

    fn users(&self) -> impl Iterator<Item = &UserId> {
        self.cells.keys().map(|(user_id, _)| user_id)
    }
}

#[derive(Default)]
pub struct AggregationEngine {
    problems: DashMap<ProblemId, Arc<Mutex<ProblemStats>>>,
    contests: DashMap<ContestId, Arc<Mutex<ContestBoard>>>,
    /// Deleted ids. Late evaluations for them are dropped.
    retired_problems: DashSet<ProblemId>,
    retired_contests: DashSet<ContestId>,
    submitted: AtomicU64,
    /// Latest verdict of every judged submission.
    verdicts: DashMap<Verdict, u64>,
}

impl AggregationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // The retired check runs under the shard lock taken by `entry`, which
    // `forget_*` also needs to remove the record.
    fn problem_entry(&self, problem_id: &ProblemId) -> Option<Arc<Mutex<ProblemStats>>> {
        match self.problems.entry(problem_id.clone()) {
            dashmap::Entry::Occupied(entry) => Some(entry.get().clone()),
            dashmap::Entry::Vacant(_) if self.retired_problems.contains(problem_id) => None,
            dashmap::Entry::Vacant(slot) => {
                let stats = Arc::new(Mutex::new(ProblemStats::new(problem_id.clone())));
                Some(slot.insert(stats).value().clone())
            }
        }
    }

    fn board_entry(&self, contest_id: &ContestId) -> Option<Arc<Mutex<ContestBoard>>> {
        match self.contests.entry(contest_id.clone()) {
            dashmap::Entry::Occupied(entry) => Some(entry.get().clone()),
            dashmap::Entry::Vacant(_) if self.retired_contests.contains(contest_id) => None,
            dashmap::Entry::Vacant(slot) => Some(slot.insert(Arc::default()).value().clone()),
        }
    }

    /// Fold a new evaluation into the problem counters, replacing the
    /// submission's `previous` contribution if it had one.
    pub async fn record_problem(
        &self,
        problem_id: &ProblemId,
        previous: Option<&JudgeResult>,
        current: &JudgeResult,
    ) {
        let Some(entry) = self.problem_entry(problem_id) else {
            debug!(problem_id = %problem_id, "Dropping evaluation of a deleted problem");
            return;
        };
        let mut stats = entry.lock().await;
        match previous {
            Some(previous) => {
                if previous.verdict.is_accepted() {
                    stats.accepted = stats.accepted.saturating_sub(1);
                }
            }
            None => stats.judged += 1,
        }
        if current.verdict.is_accepted() {
            stats.accepted += 1;
        }
        debug!(
            problem_id = %problem_id,
            judged = stats.judged,
            accepted = stats.accepted,
            "Problem stats updated"
        );
    }

    /// Record a submission's evaluation on the contest board. Submissions
    /// that do not count for the contest are ignored, and so is an evaluation
    /// older than the one already on the board.
    pub async fn record_contest(
        &self,
        contest: &Contest,
        submission: &Submission,
        evaluation: &Evaluation,
    ) {
        if !counts_for(contest, submission) {
            return;
        }
        let Some(contest_points) = contest.points_for(&submission.problem_id) else {
            return;
        };
        let result = &evaluation.result;
        let points = contest_score(result.score, result.max_score, contest_points);

        let Some(entry) = self.board_entry(&contest.id) else {
            return;
        };
        let mut board = entry.lock().await;
        let attempts = board
            .cells
            .entry((submission.user_id.clone(), submission.problem_id.clone()))
            .or_default();
        if let Some(existing) = attempts.get(&submission.id)
            && existing.sequence > evaluation.sequence
        {
            return;
        }
        attempts.insert(
            submission.id.clone(),
            Attempt {
                sequence: evaluation.sequence,
                points,
                at: submission.created_at,
            },
        );
        debug!(
            contest_id = %contest.id,
            submission_id = %submission.id,
            points,
            "Contest board updated"
        );
    }

    pub async fn problem_stats(&self, problem_id: &ProblemId) -> ProblemStats {
        match self.problems.get(problem_id).map(|e| e.value().clone()) {
            Some(entry) => entry.lock().await.clone(),
            None => ProblemStats::new(problem_id.clone()),
        }
    }

    /// Drop a deleted problem's counters for good. The id is never
    /// tracked again.
    pub fn forget_problem(&self, problem_id: &ProblemId) {
        self.retired_problems.insert(problem_id.clone());
        self.problems.remove(problem_id);
    }

    /// Drop a deleted contest's board for good.
    pub fn forget_contest(&self, contest_id: &ContestId) {
        self.retired_contests.insert(contest_id.clone());
        self.contests.remove(contest_id);
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Move a submission from its `previous` verdict to `current`.
    pub fn record_verdict(&self, previous: Option<Verdict>, current: Verdict) {
        if let Some(previous) = previous
            && let Some(mut count) = self.verdicts.get_mut(&previous)
        {
            *count = count.saturating_sub(1);
        }
        *self.verdicts.entry(current).or_default() += 1;
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(AtomicOrdering::Relaxed)
    }

    /// Count per verdict, in [`Verdict::ALL`] order, zeros included.
    pub fn verdict_counts(&self) -> Vec<VerdictCount> {
        Verdict::ALL
            .into_iter()
            .map(|verdict| VerdictCount {
                verdict,
                count: self.verdicts.get(&verdict).map_or(0, |c| *c),
            })
            .collect()
    }

    /// Rank registered participants and everyone with a counted submission.
    ///
    /// Order: total descending, then the earliest time the total was
    /// reached, then user id. Participants with a zero total come last.
    pub async fn leaderboard(&self, contest: &Contest, now: DateTime<Utc>) -> Leaderboard {
        let entry = self.contests.get(&contest.id).map(|e| e.value().clone());
        let mut entries = match entry {
            Some(entry) => {
                let board = entry.lock().await;
                let users: BTreeSet<&UserId> =
                    contest.participants.iter().chain(board.users()).collect();
                users
                    .into_iter()
                    .map(|user_id| row(&board, contest, user_id))
                    .collect::<Vec<_>>()
            }
            None => {
                let board = ContestBoard::default();
                contest
                    .participants
                    .iter()
                    .map(|user_id| row(&board, contest, user_id))
                    .collect()
            }
        };

        entries.sort_by(compare_rows);
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.rank = index + 1;
        }

        Leaderboard {
            contest_id: contest.id.clone(),
            status: contest.status_at(now),
            generated_at: now,
            entries,
        }
    }
}

fn row(board: &ContestBoard, contest: &Contest, user_id: &UserId) -> LeaderboardEntry {
    let problems: Vec<ProblemStanding> = contest
        .problems
        .iter()
        .map(|p| board.standing(user_id, &p.problem_id))
        .collect();
    let total_score = problems.iter().map(|p| p.best_score).sum();
    let reached_at = problems.iter().filter_map(|p| p.best_at).max();
    LeaderboardEntry {
        rank: 0,
        user_id: user_id.clone(),
        total_score,
        reached_at,
        problems,
    }
}

fn compare_rows(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.total_score
        .cmp(&a.total_score)
        .then_with(|| match (a.reached_at, b.reached_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.user_id.cmp(&b.user_id))
}
