//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use queries::QueryError;
use store::{Classify, ErrorClass};

/// API-level error type that maps to HTTP responses.
///
/// Response bodies are `{"error": <message>, "kind": <kind>}`. Store and
/// driver details are logged, never returned.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain workflow error.
    Domain(DomainError),
    /// Listing error.
    Query(QueryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Query(err) => query_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

fn internal(err: &dyn std::error::Error) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal",
        "internal server error".to_string(),
    )
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, &'static str, String) {
    match &err {
        DomainError::AccountNotFound(_)
        | DomainError::ItemNotFound(_)
        | DomainError::OrderNotFound(_) => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        DomainError::InsufficientStock { .. } => {
            (StatusCode::CONFLICT, "insufficient_stock", err.to_string())
        }
        DomainError::OptimisticConflict { .. } => {
            (StatusCode::CONFLICT, "conflict", err.to_string())
        }
        DomainError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists", err.to_string()),
        DomainError::InvalidRequest(_) => {
            (StatusCode::BAD_REQUEST, "invalid_request", err.to_string())
        }
        DomainError::LockUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "lock_unavailable",
            err.to_string(),
        ),
        DomainError::RetriesExhausted { attempts, .. } => {
            tracing::warn!(error = %err, "transaction retries exhausted");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "retries_exhausted",
                format!("Contention persisted after {attempts} attempts, try again later"),
            )
        }
        DomainError::Cancelled => (
            StatusCode::GATEWAY_TIMEOUT,
            "cancelled",
            "Request deadline exceeded".to_string(),
        ),
        DomainError::Store(db) if db.classify() == ErrorClass::Transient => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unavailable",
            "Store temporarily unavailable".to_string(),
        ),
        DomainError::Store(_) | DomainError::RollbackFailed { .. } => internal(&err),
    }
}

fn query_error_to_response(err: QueryError) -> (StatusCode, &'static str, String) {
    match &err {
        QueryError::InvalidCursor(_) => {
            (StatusCode::BAD_REQUEST, "invalid_cursor", err.to_string())
        }
        QueryError::CorruptRow(_) | QueryError::Database(_) => internal(&err),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}
