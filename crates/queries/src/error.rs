//! Query error types.

use thiserror::Error;

use crate::cursor::CursorError;

/// Errors that can occur while reading pages.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The client sent a cursor this service did not produce.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),

    /// A stored value could not be mapped to its model.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// An error occurred in the database.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
