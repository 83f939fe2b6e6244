//! Bounded retry loop for optimistic-concurrency conflicts.

use std::future::Future;

use tracing::{debug, warn};

use super::LendingError;

/// Outcome of one optimistic attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Attempt<T> {
    /// The write was accepted.
    Complete(T),
    /// Another writer got there first; re-read and try again.
    Conflicted,
}

/// How many times a conflicting write is retried before giving up.
///
/// # Examples
///
/// ```
/// use lending::domain::ConflictRetryPolicy;
///
/// let policy = ConflictRetryPolicy::new(3);
/// assert_eq!(policy.max_attempts(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictRetryPolicy {
    max_retries: u32,
}

impl ConflictRetryPolicy {
    /// Default number of retries after the first attempt.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Build a policy allowing `max_retries` retries after the first attempt.
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `operation` until it completes, fails, or conflicts on every
    /// allowed attempt.
    ///
    /// Exhaustion surfaces as [`LendingError::ConcurrentModification`] naming
    /// `resource`.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        resource: &str,
        mut operation: F,
    ) -> Result<T, LendingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Attempt<T>, LendingError>>,
    {
        let max_attempts = self.max_attempts();
        for attempt in 1..=max_attempts {
            match operation().await? {
                Attempt::Complete(value) => return Ok(value),
                Attempt::Conflicted if attempt < max_attempts => {
                    debug!(resource, attempt, "write conflicted; retrying");
                    tokio::task::yield_now().await;
                }
                Attempt::Conflicted => {}
            }
        }
        warn!(resource, attempts = max_attempts, "conflict retries exhausted");
        Err(LendingError::concurrent_modification(resource, max_attempts))
    }
}

impl Default for ConflictRetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES)
    }
}

#[cfg(test)]
mod tests {
    //! Retry budget coverage.

    use std::sync::atomic::{AtomicU32, Ordering};

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn completes_after_transient_conflicts() {
        let calls = AtomicU32::new(0);
        let result = ConflictRetryPolicy::new(3)
            .run("rental", || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 2 {
                        Ok(Attempt::Conflicted)
                    } else {
                        Ok(Attempt::Complete(call))
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn exhaustion_reports_concurrent_modification() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = ConflictRetryPolicy::new(2)
            .run("rental", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Attempt::Conflicted) }
            })
            .await;
        assert_eq!(
            result,
            Err(LendingError::ConcurrentModification {
                resource: "rental".to_owned(),
                attempts: 3,
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = ConflictRetryPolicy::default()
            .run("book", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(LendingError::storage("boom")) }
            })
            .await;
        assert_eq!(result, Err(LendingError::storage("boom")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn zero_retries_still_attempts_once() {
        let result = ConflictRetryPolicy::new(0)
            .run("book", || async { Ok(Attempt::Complete(7)) })
            .await;
        assert_eq!(result, Ok(7));
    }
}
