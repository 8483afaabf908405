//! Order placement and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::OrderId;
use domain::{CreateOrder, Order};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

/// POST /orders: place an order in one all-or-nothing transaction.
///
/// Responds 409 when any line is short on stock and 503 when contention
/// outlasts the retry budget.
#[tracing::instrument(skip(state, req), fields(account_id = %req.account_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .orders
        .create_order(req, &state.cancel_signal())
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id}: the order with its lines.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.get_order(OrderId::new(id)).await?;
    Ok(Json(order))
}
