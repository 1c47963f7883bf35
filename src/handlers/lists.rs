//! Shopping list handlers: CRUD plus sharing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::errors::{AppError, ValidationErrorExt};
use crate::store::types::{ListId, ShoppingList};
use crate::validation;

use super::types::{ListView, ShareView};
use super::AppState;

fn default_can_edit() -> bool {
    true
}

/// Request to create a list
#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    pub description: Option<String>,
    pub store: Option<String>,
}

/// Request to update a list
#[derive(Debug, Deserialize)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request to share a list with another user
#[derive(Debug, Deserialize)]
pub struct ShareListRequest {
    pub email: String,
    #[serde(default = "default_can_edit")]
    pub can_edit: bool,
}

/// Response for GET /api/lists
#[derive(Debug, Serialize, Deserialize)]
pub struct ListOverviewResponse {
    pub owned: Vec<ListView>,
    pub shared: Vec<ListView>,
}

/// Assemble the full client view of a list: items, owner, shares.
fn build_list_view(state: &AppState, list: ShoppingList) -> Result<ListView, AppError> {
    let items = state.lists.items_for_list(&list.id)?;

    let owner = state.users.get(&list.owner_id)?.map(|u| u.summary());

    let mut shared_with = Vec::new();
    for share in state.lists.shares_for_list(&list.id)? {
        if let Some(user) = state.users.get(&share.user_id)? {
            shared_with.push(ShareView::new(share, user.summary()));
        }
    }

    Ok(ListView {
        list,
        items,
        owner,
        shared_with,
    })
}

/// GET /api/lists - owned and shared lists for the current user
pub async fn list_lists(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ListOverviewResponse>, AppError> {
    let mut owned = Vec::new();
    for list in state.lists.lists_for_owner(&auth.id)? {
        owned.push(build_list_view(&state, list)?);
    }

    let mut shared = Vec::new();
    for (list, _share) in state.lists.lists_shared_with(&auth.id)? {
        shared.push(build_list_view(&state, list)?);
    }

    Ok(Json(ListOverviewResponse { owned, shared }))
}

/// POST /api/lists - create a list
pub async fn create_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<ListView>), AppError> {
    validation::validate_list_name(&req.name).map_validation_err("name")?;
    if let Some(d) = &req.description {
        validation::validate_free_text(d).map_validation_err("description")?;
    }
    if let Some(s) = &req.store {
        validation::validate_free_text(s).map_validation_err("store")?;
    }

    let now = Utc::now();
    let list = ShoppingList {
        id: crate::store::types::ListId::new(),
        name: req.name,
        description: req.description.filter(|d| !d.is_empty()),
        store: req.store.filter(|s| !s.is_empty()),
        owner_id: auth.id,
        created_at: now,
        updated_at: now,
    };
    state.lists.create_list(&list)?;

    Ok((StatusCode::CREATED, Json(build_list_view(&state, list)?)))
}

/// GET /api/lists/{id} - a single list with items and shares
pub async fn get_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(list_id): Path<ListId>,
) -> Result<Json<ListView>, AppError> {
    let (list, _access) = state.require_list_access(&list_id, &auth.id, false)?;
    Ok(Json(build_list_view(&state, list)?))
}

/// PUT /api/lists/{id} - update name/description (owner or editor)
pub async fn update_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(list_id): Path<ListId>,
    Json(req): Json<UpdateListRequest>,
) -> Result<Json<ListView>, AppError> {
    let (mut list, _access) = state.require_list_access(&list_id, &auth.id, true)?;

    if let Some(name) = req.name {
        validation::validate_list_name(&name).map_validation_err("name")?;
        list.name = name;
    }
    if let Some(description) = req.description {
        validation::validate_free_text(&description).map_validation_err("description")?;
        list.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
    }
    list.updated_at = Utc::now();

    state.lists.update_list(&list)?;
    Ok(Json(build_list_view(&state, list)?))
}

/// Response for DELETE /api/lists/{id}
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteListResponse {
    pub message: String,
}

/// DELETE /api/lists/{id} - owner only, cascades items and shares
pub async fn delete_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(list_id): Path<ListId>,
) -> Result<Json<DeleteListResponse>, AppError> {
    let list = state
        .lists
        .get_list(&list_id)?
        .filter(|l| l.owner_id == auth.id)
        .ok_or_else(|| AppError::ListNotFound(list_id.to_string()))?;

    state.lists.delete_list(&list)?;

    Ok(Json(DeleteListResponse {
        message: "List deleted successfully".to_string(),
    }))
}

/// POST /api/lists/{id}/share - share with a user by email (owner only)
pub async fn share_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(list_id): Path<ListId>,
    Json(req): Json<ShareListRequest>,
) -> Result<(StatusCode, Json<ShareView>), AppError> {
    let (share, target) = state.share_list(&auth.id, &list_id, &req.email, req.can_edit)?;
    Ok((StatusCode::CREATED, Json(ShareView::new(share, target))))
}
