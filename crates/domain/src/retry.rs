//! Optimistic update loop shared by the ledger and the order store.

use std::time::Duration;

use record_store::{RecordStore, RecordStoreExt, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DomainError, Result};

/// Bounded retry budget for compare-and-set races.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of compare-and-set attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles on every further retry.
    pub initial_backoff: Duration,
    /// Upper bound for a single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget and backoff bounds.
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    /// A policy that never sleeps, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// The same backoff with no attempt limit. Lost races are retried until the
    /// write lands; only store failures end the loop.
    pub fn without_attempt_limit(self) -> Self {
        Self {
            max_attempts: u32::MAX,
            ..self
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Applies `op` to the record under `key` and commits the result with
/// compare-and-set, re-reading and retrying when another writer won the race.
///
/// `op` sees the freshly read value on every attempt, so any check it performs
/// (e.g. sufficient stock) is evaluated against the version being replaced.
/// Errors returned by `op` abort immediately without writing.
pub(crate) async fn update_with_retry<S, T, F>(
    store: &S,
    key: &str,
    policy: &RetryPolicy,
    store_label: &'static str,
    not_found: impl Fn() -> DomainError + Send,
    mut op: F,
) -> Result<T>
where
    S: RecordStore,
    T: Serialize + DeserializeOwned + Send + Sync,
    F: FnMut(&T) -> Result<T> + Send,
{
    let mut attempt = 0;
    loop {
        attempt += 1;

        let current = store.get_as::<T>(key).await?.ok_or_else(&not_found)?;
        let next = op(&current.value)?;

        match store.compare_and_set_as(key, current.version, &next).await {
            Ok(committed) => return Ok(committed.value),
            Err(StoreError::ConcurrencyConflict { .. }) => {
                metrics::counter!("record_cas_conflicts_total", "store" => store_label)
                    .increment(1);
                if attempt >= policy.max_attempts {
                    tracing::warn!(%key, attempt, "retry budget exhausted");
                    return Err(DomainError::Contention {
                        key: key.to_string(),
                        attempts: attempt,
                    });
                }
                let delay = policy.backoff(attempt);
                tracing::debug!(%key, attempt, ?delay, "lost update race, retrying");
                if delay.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(StoreError::NotFound(_)) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        }
    }
}
