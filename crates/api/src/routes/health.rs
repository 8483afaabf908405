//! Health check endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::AppState;

const PING_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// GET /health: reports whether the process can reach the database.
pub async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let ping = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.pool);
    let reachable = matches!(tokio::time::timeout(PING_TIMEOUT, ping).await, Ok(Ok(_)));

    if reachable {
        let body = HealthResponse {
            status: "ok",
            database: "up",
        };
        (StatusCode::OK, Json(body))
    } else {
        tracing::warn!("health check could not reach the database");
        let body = HealthResponse {
            status: "degraded",
            database: "down",
        };
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }
}
