//! Bounded retries with jittered exponential backoff.

use std::time::Duration;

use futures_util::future::BoxFuture;
use rand::Rng;

use crate::executor::{StepError, settle};
use crate::{CancelSignal, Classify, SourceError, TransactionSource, TxError, TxOptions};

/// Retry parameters for [`RetryingExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry. Doubles after each retry.
    pub base_backoff: Duration,

    /// Upper bound on the doubled delay. `None` leaves growth uncapped.
    pub max_backoff: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(50),
            max_backoff: None,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default base backoff.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Sets the delay before the first retry.
    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Caps the doubled delay.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = Some(max_backoff);
        self
    }

    /// Returns the delay that follows `current`.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        let doubled = current.saturating_mul(2);
        match self.max_backoff {
            Some(cap) => doubled.min(cap),
            None => doubled,
        }
    }
}

/// Adds a uniform random jitter in `[0, backoff / 4)` to `backoff`.
pub fn jittered(backoff: Duration) -> Duration {
    let quarter = backoff / 4;
    if quarter.is_zero() {
        return backoff;
    }
    backoff + rand::rng().random_range(Duration::ZERO..quarter)
}

/// Runs a unit of work in a fresh transaction per attempt, retrying
/// retryable failures under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryingExecutor<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: TransactionSource> RetryingExecutor<S> {
    /// Creates an executor over `source` with an explicit policy.
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Returns the underlying transaction source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `work` until it commits, fails permanently, runs out of retries
    /// or `cancel` fires.
    ///
    /// Every attempt begins its own transaction. Failures of the body and of
    /// the commit are classified the same way: a Permanent error is returned
    /// as [`TxError::Failed`], a retryable one is retried after
    /// `backoff + jitter` until `max_retries` retries have been spent, after
    /// which it is returned in [`TxError::RetriesExhausted`].
    ///
    /// `cancel` is checked before each attempt and raced against each
    /// backoff sleep. Once observed it wins over any other failure.
    pub async fn run_with_retry<T, E, F>(
        &self,
        options: TxOptions,
        cancel: &CancelSignal,
        mut work: F,
    ) -> Result<T, TxError<E>>
    where
        F: for<'t> FnMut(&'t mut S::Tx) -> BoxFuture<'t, Result<T, E>> + Send,
        E: From<SourceError<S>> + Classify + std::fmt::Display + Send,
        T: Send,
    {
        let mut backoff = self.policy.base_backoff;
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(TxError::Cancelled);
            }

            attempts += 1;
            metrics::counter!("transaction_attempts_total").increment(1);

            let error = match self.attempt(options, &mut work).await {
                Ok(value) => {
                    if attempts > 1 {
                        tracing::debug!(attempts, "transaction committed after retry");
                    }
                    return Ok(value);
                }
                Err(StepError::RollbackFailed { source, rollback }) => {
                    tracing::error!(error = %source, rollback_error = %rollback, "rollback failed");
                    return Err(TxError::RollbackFailed { source, rollback });
                }
                Err(StepError::Failed(error)) => error,
            };

            if cancel.is_cancelled() {
                return Err(TxError::Cancelled);
            }

            let class = error.classify();
            if !class.is_retryable() {
                return Err(TxError::Failed(error));
            }

            if attempts > self.policy.max_retries {
                tracing::warn!(attempts, class = %class, error = %error, "transaction retries exhausted");
                metrics::counter!("transaction_retries_exhausted_total").increment(1);
                return Err(TxError::RetriesExhausted {
                    attempts,
                    source: error,
                });
            }

            let delay = jittered(backoff);
            tracing::warn!(
                attempt = attempts,
                class = %class,
                delay = ?delay,
                "retrying transaction"
            );
            metrics::counter!("transaction_retries_total", "class" => class.as_str()).increment(1);

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(TxError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }

            backoff = self.policy.next_backoff(backoff);
        }
    }

    async fn attempt<T, E, F>(&self, options: TxOptions, work: &mut F) -> Result<T, StepError<E>>
    where
        F: for<'t> FnMut(&'t mut S::Tx) -> BoxFuture<'t, Result<T, E>> + Send,
        E: From<SourceError<S>> + Send,
        T: Send,
    {
        let mut tx = self
            .source
            .begin(options)
            .await
            .map_err(|err| StepError::Failed(err.into()))?;

        let outcome = work(&mut tx).await;
        settle(tx, outcome).await
    }
}
