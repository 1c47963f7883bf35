//! Item handlers. Adding an item is the history-aware ingestion path: the
//! response carries both the created item and the most similar previously
//! bought item, if any.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::errors::{AppError, ValidationErrorExt};
use crate::store::types::{ItemId, ListId, ShoppingListItem};
use crate::validation;

use super::types::SimilarSuggestion;
use super::AppState;

/// Request to add an item to a list
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub quantity: Option<String>,
    pub characteristics: Option<String>,
}

/// Response for item creation: the item plus an optional history suggestion
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateItemResponse {
    pub item: ShoppingListItem,
    pub similar_item: Option<SimilarSuggestion>,
}

/// Request to update an item
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub characteristics: Option<String>,
    pub completed: Option<bool>,
}

/// POST /api/lists/{id}/items - add an item (owner or editor)
pub async fn create_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(list_id): Path<ListId>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<CreateItemResponse>), AppError> {
    state.require_list_access(&list_id, &auth.id, true)?;

    let (item, similar_item) = state.add_item(
        &auth.id,
        &list_id,
        &req.name,
        req.quantity.filter(|q| !q.is_empty()),
        req.characteristics.filter(|c| !c.is_empty()),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CreateItemResponse { item, similar_item }),
    ))
}

/// PUT /api/lists/{id}/items/{item_id} - update an item (owner or editor)
///
/// Setting `completed` stamps or clears the completion metadata; the
/// completing user is recorded for the purchase history.
pub async fn update_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((list_id, item_id)): Path<(ListId, ItemId)>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<ShoppingListItem>, AppError> {
    state.require_list_access(&list_id, &auth.id, true)?;

    let mut item = state
        .lists
        .get_item(&list_id, &item_id)?
        .ok_or_else(|| AppError::ItemNotFound(item_id.to_string()))?;

    if let Some(name) = req.name {
        validation::validate_item_name(&name).map_validation_err("name")?;
        item.name = name;
    }
    if let Some(quantity) = req.quantity {
        validation::validate_free_text(&quantity).map_validation_err("quantity")?;
        item.quantity = if quantity.is_empty() {
            None
        } else {
            Some(quantity)
        };
    }
    if let Some(characteristics) = req.characteristics {
        validation::validate_free_text(&characteristics).map_validation_err("characteristics")?;
        item.characteristics = if characteristics.is_empty() {
            None
        } else {
            Some(characteristics)
        };
    }
    if let Some(completed) = req.completed {
        item.completed = completed;
        if completed {
            item.completed_at = Some(Utc::now());
            item.completed_by = Some(auth.id);
        } else {
            item.completed_at = None;
            item.completed_by = None;
        }
    }

    state.lists.update_item(&item)?;
    Ok(Json(item))
}

/// Response for DELETE /api/lists/{id}/items/{item_id}
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteItemResponse {
    pub message: String,
}

/// DELETE /api/lists/{id}/items/{item_id} - remove an item (owner or editor)
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((list_id, item_id)): Path<(ListId, ItemId)>,
) -> Result<Json<DeleteItemResponse>, AppError> {
    state.require_list_access(&list_id, &auth.id, true)?;

    if !state.lists.delete_item(&list_id, &item_id)? {
        return Err(AppError::ItemNotFound(item_id.to_string()));
    }

    Ok(Json(DeleteItemResponse {
        message: "Item deleted successfully".to_string(),
    }))
}
