//! Bounded fixed-interval polling for vendors without webhooks.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// One status-check observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// Job still running, keep polling.
    Pending,
    /// Job finished successfully with this payload.
    Complete(T),
    /// Vendor reported a terminal failure.
    Failed(String),
}

/// How long and how often to poll one vendor job.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Overall wall-clock budget. One extra interval on top of the attempt
    /// budget so slow responses cannot starve the final attempt.
    pub fn deadline(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts + 1)
    }
}

/// Poll `fetch` until the job reaches a terminal state.
///
/// Sleeps one interval before every fetch. Transport errors from `fetch` are
/// logged and treated as a pending observation; only a vendor-reported
/// failure or attempt/deadline exhaustion ends the loop early.
pub async fn poll_until_terminal<T, E, F, Fut>(
    policy: &PollPolicy,
    mut fetch: F,
) -> Result<T, PollError>
where
    E: fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollOutcome<T>, E>>,
{
    let started = Instant::now();
    let deadline = policy.deadline();

    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        if started.elapsed() > deadline {
            return Err(PollError::TimedOut {
                attempts: attempt - 1,
            });
        }

        match fetch(attempt).await {
            Ok(PollOutcome::Complete(value)) => return Ok(value),
            Ok(PollOutcome::Failed(message)) => return Err(PollError::JobFailed(message)),
            Ok(PollOutcome::Pending) => {}
            Err(e) => {
                tracing::warn!(attempt, error = %e, "status poll attempt failed");
            }
        }
    }

    Err(PollError::TimedOut {
        attempts: policy.max_attempts,
    })
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PollError {
    #[error("vendor job did not reach a terminal state after {attempts} polls")]
    TimedOut { attempts: u32 },

    #[error("vendor reported job failure: {0}")]
    JobFailed(String),
}
