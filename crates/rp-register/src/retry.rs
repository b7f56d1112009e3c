//! Retry of remote operations that fail with an optimistic-concurrency
//! conflict.
//!
//! Only HTTP 409 is treated as transient. The operation is retried with an
//! exponentially growing wait until it succeeds, fails with any other error,
//! runs out of attempts, or the [`Context`] finishes.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::ExponentialBackoffBuilder;
use backoff::backoff::Backoff;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{Cancellation, Context};
use crate::store::RemoteError;

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

const MAX_BACKOFF: Duration = Duration::from_secs(60 * 60);

/// How often and how patiently a conflicting operation is retried.
///
/// Waits double from `initial_backoff` up to a one hour cap. A policy whose
/// schedule reaches the cap would wait the same time twice; [`RetryPolicy::validate`]
/// rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Wait before the second attempt; doubles after every conflict.
    #[serde(rename = "initial_backoff_ms", with = "millis")]
    pub initial_backoff: Duration,
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// The wait schedule: initial backoff, doubling, no jitter.
    fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(MAX_BACKOFF)
            .with_max_elapsed_time(None)
            .build()
    }

    /// The waits taken between attempts if every attempt conflicts.
    pub fn waits(&self) -> Vec<Duration> {
        let mut schedule = self.schedule();
        (1..self.max_attempts.max(1))
            .map(|_| schedule.next_backoff().unwrap_or(MAX_BACKOFF))
            .collect()
    }

    /// Check that at least one attempt is made and that every wait is longer
    /// than the one before it.
    pub fn validate(&self) -> Result<(), InvalidRetryPolicy> {
        if self.max_attempts == 0 {
            return Err(InvalidRetryPolicy::NoAttempts);
        }
        if self.waits().windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(InvalidRetryPolicy::WaitsStopGrowing {
                max_attempts: self.max_attempts,
            });
        }
        Ok(())
    }
}

/// Why a [`RetryPolicy`] cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRetryPolicy {
    #[error("retry.max_attempts must be at least 1")]
    NoAttempts,

    #[error(
        "retry.max_attempts {max_attempts} is too high for retry.initial_backoff_ms, waits would stop increasing at the 1h cap"
    )]
    WaitsStopGrowing { max_attempts: u32 },
}

/// Reported before each wait.
#[derive(Debug)]
pub struct RetryNotice<'a, E> {
    /// The attempt that just conflicted, starting at 1.
    pub attempt: u32,
    pub max_attempts: u32,
    pub error: &'a E,
    pub wait: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// A non-conflict failure, returned without retrying.
    #[error(transparent)]
    Operation(E),

    /// Every attempt conflicted.
    #[error("exceeded {attempts} retries, err: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    #[error(transparent)]
    Cancelled(#[from] Cancellation),
}

impl<E> RetryError<E> {
    /// The operation error, if there is one.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            RetryError::Operation(e) | RetryError::Exhausted { source: e, .. } => Some(e),
            RetryError::Cancelled(_) => None,
        }
    }
}

/// Whether `error`, or anything in its source chain, is a 409 from the
/// control plane.
pub fn is_conflict(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if e.downcast_ref::<RemoteError>().is_some_and(RemoteError::is_conflict) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Run `operation`, retrying it while it fails with a conflict.
///
/// `on_retry` is called before every wait. No wait follows the last attempt.
/// A context that finishes during a wait ends the call with
/// [`RetryError::Cancelled`] and the operation is not called again.
pub async fn with_retry<T, E, F, Fut, N>(
    ctx: &Context,
    policy: &RetryPolicy,
    mut operation: F,
    mut on_retry: N,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
    N: FnMut(&RetryNotice<'_, E>),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut schedule = policy.schedule();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !is_conflict(&error) {
            return Err(RetryError::Operation(error));
        }
        if attempt >= max_attempts {
            debug!(attempts = max_attempts, "conflict retries exhausted");
            return Err(RetryError::Exhausted {
                attempts: max_attempts,
                source: error,
            });
        }

        let wait = schedule.next_backoff().unwrap_or(MAX_BACKOFF);
        debug!(attempt, max_attempts, ?wait, %error, "conflict, retrying");
        on_retry(&RetryNotice {
            attempt,
            max_attempts,
            error: &error,
            wait,
        });

        tokio::select! {
            biased;
            cancellation = ctx.done() => return Err(RetryError::Cancelled(cancellation)),
            _ = tokio::time::sleep(wait) => {}
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
