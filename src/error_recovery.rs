// src/error_recovery.rs
//! Retry with classified errors and jittered backoff for API operations.
//!
//! Every call site that needs retry semantics goes through
//! [`do_with_retry`], parameterised by a classification function and a
//! [`RetryPolicy`]. The executor stops on the first permanent or unknown
//! failure, when the real-failure budget is spent, or when the hard attempt
//! ceiling is reached, whichever comes first.

use crate::constants::{BACKOFF_BASE, BACKOFF_CAP, MAX_RETRY_WAIT};
use crate::error::{AppError, ErrorClass};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Wait strategy used when the server gives no reset hint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uniform in `[0, min(base * 2^attempt, cap)]`
    FullJitter { base: Duration, cap: Duration },
    /// `step * attempt`
    Linear { step: Duration },
}

impl Backoff {
    /// Delay before retry number `attempt` (1-based).
    fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::FullJitter { .. } => {
                let upper_ms = self.ceiling(attempt).as_millis() as u64;
                if upper_ms == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rand::rng().random_range(0..=upper_ms))
            }
            Backoff::Linear { step } => step.saturating_mul(attempt),
        }
    }

    /// Largest delay `attempt` can draw.
    fn ceiling(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::FullJitter { base, cap } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(cap)
            }
            Backoff::Linear { step } => step.saturating_mul(attempt),
        }
    }
}

/// Bounds and pacing of one retried operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Real failures tolerated before giving up.
    pub max_retries: u32,
    /// Hard ceiling on dispatches, whatever their outcome.
    pub max_total_attempts: u32,
    /// Keep rate-limit responses out of the real-failure count.
    pub retry_on_rate_limit: bool,
    pub backoff: Backoff,
    /// Upper bound on any single wait.
    pub max_wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, max_total_attempts: u32) -> Self {
        Self {
            max_retries,
            max_total_attempts: max_total_attempts.max(1),
            retry_on_rate_limit: true,
            backoff: Backoff::FullJitter {
                base: BACKOFF_BASE,
                cap: BACKOFF_CAP,
            },
            max_wait: MAX_RETRY_WAIT,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Count rate-limit responses against `max_retries` like real failures.
    pub fn count_rate_limits(mut self) -> Self {
        self.retry_on_rate_limit = false;
        self
    }

    /// Wait before the next attempt: the server hint with ±10% jitter when
    /// present, the configured backoff otherwise, capped at `max_wait`.
    fn wait_for(&self, error: &AppError, attempt: u32) -> Duration {
        let wait = match error.reset_hint() {
            Some(hint) => hint.mul_f64(rand::rng().random_range(0.9..=1.1)),
            None => self.backoff.delay(attempt),
        };
        wait.min(self.max_wait)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 10)
    }
}

/// A successful result with the effort it took.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: u32,
    pub rate_limited: u32,
}

/// The final error with the effort spent before giving up.
#[derive(Debug)]
pub struct RetryFailure {
    pub error: AppError,
    pub attempts: u32,
    pub rate_limited: u32,
}

/// Runs `operation` until it succeeds or the policy says stop.
///
/// `operation` receives the 1-based attempt number. `classify` decides how
/// each failure is treated; callers pass `AppError::classify` or a wrapper
/// that adds their own permanent-error cases. Cancellation is observed while
/// waiting and before each dispatch.
pub async fn do_with_retry<T, F, Fut, C>(
    cancel: &CancellationToken,
    policy: &RetryPolicy,
    classify: C,
    mut operation: F,
) -> Result<RetryOutcome<T>, RetryFailure>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
    C: Fn(&AppError) -> ErrorClass,
{
    let mut attempts = 0u32;
    let mut failures = 0u32;
    let mut rate_limited = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryFailure {
                error: AppError::Cancelled,
                attempts,
                rate_limited,
            });
        }

        attempts += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            result = operation(attempts) => result,
        };

        let error = match result {
            Ok(value) => {
                return Ok(RetryOutcome {
                    value,
                    attempts,
                    rate_limited,
                })
            }
            Err(error) => error,
        };

        if matches!(error, AppError::Cancelled) {
            return Err(RetryFailure {
                error,
                attempts,
                rate_limited,
            });
        }

        match classify(&error) {
            ErrorClass::Permanent | ErrorClass::Unknown => {
                return Err(RetryFailure {
                    error,
                    attempts,
                    rate_limited,
                });
            }
            ErrorClass::RateLimited => {
                rate_limited += 1;
                if !policy.retry_on_rate_limit {
                    failures += 1;
                }
            }
            ErrorClass::Retryable => failures += 1,
        }

        if attempts >= policy.max_total_attempts {
            return Err(RetryFailure {
                error: AppError::RetryCeilingReached {
                    attempts,
                    last: Box::new(error),
                },
                attempts,
                rate_limited,
            });
        }

        if failures > policy.max_retries {
            return Err(RetryFailure {
                error: AppError::RetriesExhausted {
                    failures,
                    last: Box::new(error),
                },
                attempts,
                rate_limited,
            });
        }

        let wait = policy.wait_for(&error, attempts);
        log::debug!("Attempt {} failed ({}), retrying after {:?}", attempts, error, wait);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RetryFailure {
                    error: AppError::Cancelled,
                    attempts,
                    rate_limited,
                });
            }
            _ = tokio::time::sleep(wait) => {}
        }
    }
}
