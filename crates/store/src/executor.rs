use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::{Classify, TxError, TxOptions};

/// A transaction opened by a [`TransactionSource`].
///
/// Dropping a handle without committing must roll the transaction back.
#[async_trait]
pub trait TransactionHandle: Send + Sized {
    /// The store's native error.
    type Error: Classify + std::error::Error + Send + Sync + 'static;

    /// Commits the transaction.
    async fn commit(self) -> Result<(), Self::Error>;

    /// Rolls the transaction back.
    async fn rollback(self) -> Result<(), Self::Error>;
}

/// Anything that can begin transactions.
///
/// This is the only storage capability the executors need; queries and
/// statements go through the handle itself.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// The transaction handle type.
    type Tx: TransactionHandle;

    /// Begins a transaction with the given isolation level and access mode.
    async fn begin(&self, options: TxOptions) -> Result<Self::Tx, SourceError<Self>>;
}

/// The native error of a transaction source.
pub type SourceError<S> = <<S as TransactionSource>::Tx as TransactionHandle>::Error;

/// Failure of a single begin/work/commit attempt.
#[derive(Debug)]
pub(crate) enum StepError<E> {
    /// The attempt failed and its transaction is closed.
    Failed(E),
    /// The attempt failed and so did its rollback.
    RollbackFailed { source: E, rollback: E },
}

impl<E> From<StepError<E>> for TxError<E> {
    fn from(err: StepError<E>) -> Self {
        match err {
            StepError::Failed(source) => TxError::Failed(source),
            StepError::RollbackFailed { source, rollback } => {
                TxError::RollbackFailed { source, rollback }
            }
        }
    }
}

/// Closes `tx` according to the outcome of the unit of work: commit on
/// success, roll back on failure.
pub(crate) async fn settle<Tx, T, E>(tx: Tx, outcome: Result<T, E>) -> Result<T, StepError<E>>
where
    Tx: TransactionHandle,
    E: From<Tx::Error>,
{
    match outcome {
        Ok(value) => match tx.commit().await {
            Ok(()) => Ok(value),
            Err(err) => Err(StepError::Failed(err.into())),
        },
        Err(err) => match tx.rollback().await {
            Ok(()) => Err(StepError::Failed(err)),
            Err(rollback) => Err(StepError::RollbackFailed {
                source: err,
                rollback: rollback.into(),
            }),
        },
    }
}

/// Runs a unit of work inside exactly one transaction.
#[derive(Debug, Clone)]
pub struct TransactionExecutor<S> {
    source: S,
}

impl<S: TransactionSource> TransactionExecutor<S> {
    /// Creates an executor over the given source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the underlying transaction source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Begins a transaction, runs `work` with it and commits.
    ///
    /// If `work` fails the transaction is rolled back and the original error
    /// is returned; if the rollback fails too, both errors are returned in
    /// [`TxError::RollbackFailed`]. A commit failure is returned as is.
    pub async fn run<T, E, F>(&self, options: TxOptions, work: F) -> Result<T, TxError<E>>
    where
        F: for<'t> FnOnce(&'t mut S::Tx) -> BoxFuture<'t, Result<T, E>> + Send,
        E: From<SourceError<S>> + Send,
        T: Send,
    {
        let mut tx = self
            .source
            .begin(options)
            .await
            .map_err(|err| TxError::Failed(err.into()))?;

        let outcome = work(&mut tx).await;
        settle(tx, outcome).await.map_err(TxError::from)
    }
}
