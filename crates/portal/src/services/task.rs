//! Cancellable simulated round trips, in-flight markers and retries.
//!
//! Every submission in the portal goes through [`TaskSettings::perform`]:
//! wait out the simulated latency, then call the backend with retries. Both
//! phases race the owning component's [`CancellationToken`], so closing a
//! prompt or logging out drops the work instead of letting it land late.

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The owning component was torn down before the task finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Outcome of a cancellable task that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError<E> {
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Failed(E),
}

impl<E> From<Cancelled> for TaskError<E> {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Errors that know whether repeating the call can help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// A single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Delay before retry number `retry` (0-based), capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Timing shared by every workflow that talks to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSettings {
    /// Simulated network round trip before the backend call.
    pub latency: Duration,
    pub retry: RetryPolicy,
}

impl TaskSettings {
    /// No latency and no retries.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            latency: Duration::ZERO,
            retry: RetryPolicy::none(),
        }
    }

    /// Simulated round trip followed by a retried backend call.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Cancelled`] if `cancel` fires first, or
    /// [`TaskError::Failed`] with the last backend error.
    pub async fn perform<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<T, TaskError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        round_trip(cancel, self.latency).await?;
        retry(&self.retry, cancel, op).await
    }
}

/// Wait out `latency`, unless `cancel` fires first.
///
/// # Errors
///
/// Returns [`Cancelled`] if the token is or becomes cancelled.
pub async fn round_trip(cancel: &CancellationToken, latency: Duration) -> Result<(), Cancelled> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Cancelled),
        () = tokio::time::sleep(latency) => Ok(()),
    }
}

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
///
/// Only errors reporting [`Retryable::is_retryable`] are retried.
///
/// # Errors
///
/// Returns [`TaskError::Cancelled`] if `cancel` fires, otherwise the last
/// error from `op` as [`TaskError::Failed`].
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, TaskError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TaskError::Cancelled),
            result = op() => result,
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt - 1);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Backend call failed, retrying"
                );
                round_trip(cancel, delay).await?;
                attempt += 1;
            }
            Err(e) => return Err(TaskError::Failed(e)),
        }
    }
}

/// Busy flag for a form: at most one submission at a time.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    flag: Arc<AtomicBool>,
}

impl InFlight {
    /// Mark the form busy. `None` if a submission is already running.
    #[must_use]
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                flag: Arc::clone(&self.flag),
            })
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Clears its [`InFlight`] flag when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Per-key busy markers: actions on different keys proceed independently.
#[derive(Debug)]
pub struct InFlightSet<K> {
    keys: Arc<Mutex<HashSet<K>>>,
}

impl<K> Default for InFlightSet<K> {
    fn default() -> Self {
        Self {
            keys: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> InFlightSet<K> {
    /// Mark `key` busy. `None` if it already is.
    #[must_use]
    pub fn try_begin(&self, key: K) -> Option<KeyGuard<K>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.insert(key.clone()).then(|| KeyGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears its key from an [`InFlightSet`] when dropped.
#[derive(Debug)]
pub struct KeyGuard<K: Eq + Hash> {
    keys: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> Drop for KeyGuard<K> {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
