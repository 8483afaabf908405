//! Account endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::AccountId;
use domain::{Account, NewAccount};
use queries::{CursorPage, OffsetPage, OrderSummary, cursor};

use super::{CursorParams, PageParams};
use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

/// POST /accounts: register a buyer.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewAccount>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = state
        .accounts
        .create_account(req, &state.cancel_signal())
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /accounts: numbered listing, newest first.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<OffsetPage<Account>>, ApiError> {
    let page_size = state.page_limits.resolve(params.page_size);
    let page = queries::list_accounts(&state.pool, params.page.unwrap_or(1), page_size).await?;
    Ok(Json(page))
}

/// GET /accounts/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Account>, ApiError> {
    let account = state.accounts.get_account(AccountId::new(id)).await?;
    Ok(Json(account))
}

/// GET /accounts/{id}/orders: keyset listing of the account's orders.
///
/// The cursor is checked before the account so a malformed token never
/// costs a round trip.
#[tracing::instrument(skip(state, params))]
pub async fn orders(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<CursorParams>,
) -> Result<Json<CursorPage<OrderSummary>>, ApiError> {
    cursor::decode_or_start(params.cursor.as_deref()).map_err(queries::QueryError::from)?;

    let account_id = AccountId::new(id);
    state.accounts.get_account(account_id).await?;

    let limit = state.page_limits.resolve(params.limit);
    let page =
        queries::list_orders(&state.pool, account_id, params.cursor.as_deref(), limit).await?;
    Ok(Json(page))
}
