use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Exponential backoff parameters shared by every retried call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries allowed after the first failure.
    pub max_retries: u8,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    ///
    /// `base * 2^(attempt - 1)` plus up to 25% jitter, capped at `max_delay_ms`.
    pub fn backoff(&self, attempt: u8) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let shift = u32::from(attempt - 1).min(63);
        let delay = self.base_delay_ms.saturating_mul(1u64 << shift);
        let jitter = match delay / 4 {
            0 => 0,
            spread => rand::rng().random_range(0..=spread),
        };
        Duration::from_millis(delay.saturating_add(jitter).min(self.max_delay_ms))
    }
}

/// What the caller should do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempt: u8, delay: Duration },
    /// No retries left. Carries every error seen, oldest first.
    Exhausted { errors: Vec<String> },
}

/// Failure log for a single retried operation.
#[derive(Debug)]
pub struct RetryTracker {
    policy: RetryPolicy,
    errors: Vec<String>,
}

impl RetryTracker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            errors: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, error: impl Into<String>) -> RetryDecision {
        self.errors.push(error.into());
        let failures = u8::try_from(self.errors.len()).unwrap_or(u8::MAX);

        if failures > self.policy.max_retries {
            return RetryDecision::Exhausted {
                errors: std::mem::take(&mut self.errors),
            };
        }
        RetryDecision::Retry {
            attempt: failures,
            delay: self.policy.backoff(failures),
        }
    }
}
