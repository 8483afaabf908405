//! Transaction plumbing for the order-processing engine.
//!
//! This crate owns the parts of the engine that decide *how* a unit of work
//! touches the database:
//! - [`Classify`] maps a store error to a retry disposition ([`ErrorClass`])
//! - [`TransactionExecutor`] runs one unit of work in one transaction
//! - [`RetryingExecutor`] repeats that under a [`RetryPolicy`] with jittered
//!   exponential backoff, observing a caller's [`CancelSignal`]
//! - [`PgStore`] is the PostgreSQL [`TransactionSource`]

pub mod cancel;
pub mod error;
pub mod executor;
pub mod options;
pub mod postgres;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancelSignal;
pub use error::{Classify, ErrorClass, TxError, classify_sqlstate, sqlstate};
pub use executor::{SourceError, TransactionExecutor, TransactionHandle, TransactionSource};
pub use options::{IsolationLevel, ParseIsolationLevelError, TxOptions};
pub use postgres::{DatabaseConfig, PgStore, PgTx};
pub use retry::{RetryPolicy, RetryingExecutor};
