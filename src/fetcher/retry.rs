//! Retry combinator
//!
//! Runs an async operation up to N times with an escalating per-attempt
//! timeout and a fixed pause between attempts. Each attempt future is dropped
//! when its timeout fires, which cancels the in-flight request.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

// == Retry Policy ==
/// Attempt count, per-attempt timeouts and the pause between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    timeouts: Vec<Duration>,
    pause: Duration,
}

impl RetryPolicy {
    /// One attempt per entry in `timeouts`. An empty ladder falls back to
    /// the default one.
    pub fn new(timeouts: Vec<Duration>, pause: Duration) -> Self {
        if timeouts.is_empty() {
            return Self {
                pause,
                ..Self::default()
            };
        }
        Self { timeouts, pause }
    }

    pub fn attempts(&self) -> usize {
        self.timeouts.len()
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Timeout for the 1-based `attempt`; the last rung repeats.
    pub fn timeout_for(&self, attempt: usize) -> Duration {
        let index = attempt.saturating_sub(1).min(self.timeouts.len() - 1);
        self.timeouts[index]
    }

    /// Upper bound on the wall time of a fully failing run.
    pub fn worst_case(&self) -> Duration {
        let pauses = self.pause * (self.attempts() as u32).saturating_sub(1);
        self.timeouts.iter().sum::<Duration>() + pauses
    }
}

impl Default for RetryPolicy {
    /// 3s, 5s, 8s with a one second pause.
    fn default() -> Self {
        Self {
            timeouts: vec![
                Duration::from_secs(3),
                Duration::from_secs(5),
                Duration::from_secs(8),
            ],
            pause: Duration::from_secs(1),
        }
    }
}

// == Outcomes ==
/// How a single attempt failed.
#[derive(Debug)]
pub enum AttemptError<E> {
    TimedOut(Duration),
    Failed(E),
}

/// Why the combinator gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A non-retryable error; no further attempts were made.
    Terminal(E),
    /// All attempts failed; `last` is the final cause.
    Exhausted {
        attempts: usize,
        last: AttemptError<E>,
    },
}

/// Runs `op` under `policy`.
///
/// `op` receives the 1-based attempt number. Timeouts and retryable errors
/// trigger another attempt after the policy's pause; a non-retryable error
/// returns immediately.
pub async fn retry_with_timeouts<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: Retryable + Display,
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        let limit = policy.timeout_for(attempt);
        debug!(
            "{} attempt {}/{} (timeout: {:?})",
            label, attempt, attempts, limit
        );

        let failure = match tokio::time::timeout(limit, op(attempt)).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Ok(Err(error)) if !error.is_retryable() => {
                warn!("{} attempt {} failed terminally: {}", label, attempt, error);
                return Err(RetryError::Terminal(error));
            }
            Ok(Err(error)) => {
                warn!("{} attempt {} failed: {}", label, attempt, error);
                AttemptError::Failed(error)
            }
            Err(_) => {
                warn!("{} attempt {} timed out after {:?}", label, attempt, limit);
                AttemptError::TimedOut(limit)
            }
        };

        if attempt >= attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: failure,
            });
        }

        tokio::time::sleep(policy.pause()).await;
        attempt += 1;
    }
}
