use thiserror::Error;

/// Retry disposition of a failed transaction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Constraint violations, missing rows and anything unrecognized.
    /// Never retried.
    Permanent,

    /// The store could not acquire a lock in time.
    Transient,

    /// The store broke a lock cycle by aborting this transaction.
    Deadlock,

    /// A concurrent transaction made this one unserializable.
    SerializationConflict,
}

impl ErrorClass {
    /// Returns true if a transaction that failed with this class may be
    /// attempted again from the beginning.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorClass::Permanent)
    }

    /// Returns the class name as used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Permanent => "permanent",
            ErrorClass::Transient => "transient",
            ErrorClass::Deadlock => "deadlock",
            ErrorClass::SerializationConflict => "serialization_conflict",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capability of an error type to report its own [`ErrorClass`].
///
/// The storage collaborator implements this for its native error, and every
/// error layered on top of it delegates, so the retry loop never inspects
/// store-specific codes itself.
pub trait Classify {
    /// Classifies this error.
    fn classify(&self) -> ErrorClass;

    /// Returns true if the class is Transient, Deadlock or SerializationConflict.
    fn is_retryable(&self) -> bool {
        self.classify().is_retryable()
    }
}

/// PostgreSQL SQLSTATE codes the classifier recognizes.
pub mod sqlstate {
    pub const SERIALIZATION_FAILURE: &str = "40001";
    pub const DEADLOCK_DETECTED: &str = "40P01";
    pub const LOCK_NOT_AVAILABLE: &str = "55P03";
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const NOT_NULL_VIOLATION: &str = "23502";
    pub const CHECK_VIOLATION: &str = "23514";
}

/// Maps a SQLSTATE code to its retry disposition.
///
/// Unknown codes are Permanent.
pub fn classify_sqlstate(code: &str) -> ErrorClass {
    match code {
        sqlstate::SERIALIZATION_FAILURE => ErrorClass::SerializationConflict,
        sqlstate::DEADLOCK_DETECTED => ErrorClass::Deadlock,
        sqlstate::LOCK_NOT_AVAILABLE => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// Outcome of a transaction run that did not produce a value.
#[derive(Debug, Error)]
pub enum TxError<E> {
    /// The caller's cancel signal fired before or between attempts.
    #[error("operation cancelled")]
    Cancelled,

    /// Every allowed attempt failed with a retryable error.
    /// `source` is the error of the last attempt.
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    /// Rolling back a failed attempt failed as well.
    #[error("rollback failed: {rollback} (original error: {source})")]
    RollbackFailed {
        #[source]
        source: E,
        rollback: E,
    },

    /// The unit of work, the commit or the begin failed.
    #[error(transparent)]
    Failed(E),
}

impl<E> TxError<E> {
    /// Returns true if the run ended because of the cancel signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TxError::Cancelled)
    }

    /// Returns the underlying error of the failed or last attempt.
    pub fn inner(&self) -> Option<&E> {
        match self {
            TxError::Cancelled => None,
            TxError::RetriesExhausted { source, .. }
            | TxError::RollbackFailed { source, .. }
            | TxError::Failed(source) => Some(source),
        }
    }
}

impl<E: Classify> Classify for TxError<E> {
    fn classify(&self) -> ErrorClass {
        match self {
            TxError::RetriesExhausted { source, .. } | TxError::Failed(source) => {
                source.classify()
            }
            TxError::Cancelled | TxError::RollbackFailed { .. } => ErrorClass::Permanent,
        }
    }
}
