//! Catalog item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::ItemId;
use domain::{Item, NewItem};
use queries::OffsetPage;

use super::PageParams;
use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

/// POST /items: add an item with its initial stock.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewItem>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = state
        .inventory
        .create_item(req, &state.cancel_signal())
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items: numbered listing, newest first.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<OffsetPage<Item>>, ApiError> {
    let page_size = state.page_limits.resolve(params.page_size);
    let page = queries::list_items(&state.pool, params.page.unwrap_or(1), page_size).await?;
    Ok(Json(page))
}

/// GET /items/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Item>, ApiError> {
    let item = state.inventory.get_item(ItemId::new(id)).await?;
    Ok(Json(item))
}
