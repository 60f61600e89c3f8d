//! Backlog item handlers
//!
//! Reads are public; create, update and delete require the API token.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use backlog_core::models::{CreateItemRequest, Item, ItemStatus, UpdateItemRequest};
use backlog_core::AppError;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::ApiTokenGuard;
use crate::error::{HttpAppError, ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::state::AppState;

pub(crate) fn item_not_found() -> AppError {
    AppError::NotFound("item not found".to_string())
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListItemsQuery {
    /// Only return items in this status
    pub status: Option<String>,
}

/// List items ordered by id
#[utoipa::path(
    get,
    path = "/items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "Items", body = Vec<Item>),
        (status = 422, description = "Unknown status filter")
    ),
    tag = "items"
)]
#[tracing::instrument(skip(state))]
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ListItemsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let status = query
        .status
        .as_deref()
        .map(ItemStatus::parse_filter)
        .transpose()?;

    let items = state.db.items.list(status).await?;
    Ok(Json(items))
}

/// Create an item
#[utoipa::path(
    post,
    path = "/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 401, description = "Missing or invalid API token"),
        (status = 422, description = "Validation failed")
    ),
    security(("api_key" = [])),
    tag = "items"
)]
#[tracing::instrument(skip(state, _guard, request))]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    _guard: ApiTokenGuard,
    ValidatedJson(request): ValidatedJson<CreateItemRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let new_item = request.into_new_item()?;
    let item = state.db.items.create(&new_item).await?;

    tracing::info!(item_id = item.id, "Item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// Get an item by id
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item", body = Item),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
#[tracing::instrument(skip(state))]
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let item = state.db.items.get(id).await?.ok_or_else(item_not_found)?;
    Ok(Json(item))
}

/// Update the provided fields of an item
#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 401, description = "Missing or invalid API token"),
        (status = 404, description = "Item not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("api_key" = [])),
    tag = "items"
)]
#[tracing::instrument(skip(state, _guard, request))]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    _guard: ApiTokenGuard,
    ValidatedPath(id): ValidatedPath<i64>,
    ValidatedJson(request): ValidatedJson<UpdateItemRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut item = state.db.items.get(id).await?.ok_or_else(item_not_found)?;

    request.into_changes()?.apply(&mut item);

    let item = state
        .db
        .items
        .update(&item)
        .await?
        .ok_or_else(item_not_found)?;
    Ok(Json(item))
}

/// Delete an item
#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 401, description = "Missing or invalid API token"),
        (status = 404, description = "Item not found")
    ),
    security(("api_key" = [])),
    tag = "items"
)]
#[tracing::instrument(skip(state, _guard))]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    _guard: ApiTokenGuard,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.db.items.delete(id).await? {
        return Err(item_not_found().into());
    }

    tracing::info!(item_id = id, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}
