//! Domain error types.

use common::{AccountId, ItemId, OrderId};
use store::{Classify, ErrorClass, TxError};
use thiserror::Error;

use crate::inventory::Revision;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The buyer account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The item does not exist.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Fewer units on hand than requested.
    #[error("Insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: i32,
        available: i32,
    },

    /// A fail-fast lock found the item row locked by another transaction.
    #[error("Item {0} is locked by another transaction")]
    LockUnavailable(ItemId),

    /// A revision-checked update found a different revision.
    #[error("Item {item_id} was modified concurrently (expected revision {expected})")]
    OptimisticConflict { item_id: ItemId, expected: Revision },

    /// A unique business key is already taken.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The request failed validation before touching the store.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Every attempt failed with a retryable error.
    #[error("Retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<DomainError>,
    },

    /// The caller cancelled the operation or its deadline passed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Rolling back a failed attempt failed as well.
    #[error("Rollback failed: {rollback} (original error: {source})")]
    RollbackFailed {
        #[source]
        source: Box<DomainError>,
        rollback: Box<DomainError>,
    },

    /// Any other store failure.
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

impl DomainError {
    /// Returns true for the not-found family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::AccountNotFound(_)
                | DomainError::ItemNotFound(_)
                | DomainError::OrderNotFound(_)
        )
    }

    /// Returns the error that decided the outcome, looking through
    /// [`DomainError::RetriesExhausted`].
    pub fn root(&self) -> &DomainError {
        match self {
            DomainError::RetriesExhausted { source, .. } => source.root(),
            other => other,
        }
    }
}

impl Classify for DomainError {
    fn classify(&self) -> ErrorClass {
        match self {
            DomainError::LockUnavailable(_) => ErrorClass::Transient,
            DomainError::Store(err) => err.classify(),
            DomainError::RetriesExhausted { source, .. } => source.classify(),
            _ => ErrorClass::Permanent,
        }
    }
}

impl From<TxError<DomainError>> for DomainError {
    fn from(err: TxError<DomainError>) -> Self {
        match err {
            TxError::Cancelled => DomainError::Cancelled,
            TxError::RetriesExhausted { attempts, source } => DomainError::RetriesExhausted {
                attempts,
                source: Box::new(source),
            },
            TxError::RollbackFailed { source, rollback } => DomainError::RollbackFailed {
                source: Box::new(source),
                rollback: Box::new(rollback),
            },
            TxError::Failed(err) => err,
        }
    }
}
