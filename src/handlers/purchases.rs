//! Purchase history: completed items across every list the user can see.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::store::types::{ListId, ShoppingListItem, UserSummary};

use super::AppState;

/// Query parameters for the purchases endpoint
#[derive(Debug, Deserialize)]
pub struct PurchasesQuery {
    /// Restrict to a single list
    pub list_id: Option<ListId>,
}

/// The list a purchase belongs to, as shown on the history page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseListInfo {
    pub id: ListId,
    pub name: String,
    pub owner: Option<UserSummary>,
}

/// One completed item with its context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseView {
    #[serde(flatten)]
    pub item: ShoppingListItem,
    pub list: PurchaseListInfo,
    /// Who checked the item off; falls back to the list owner for old rows
    pub completed_by: Option<UserSummary>,
}

/// Response for GET /api/purchases
#[derive(Debug, Serialize, Deserialize)]
pub struct PurchasesResponse {
    /// All completed items, most recent first
    pub items: Vec<PurchaseView>,
    /// The same items keyed by completion date (YYYY-MM-DD)
    pub grouped_by_date: BTreeMap<String, Vec<PurchaseView>>,
    pub total: usize,
}

/// GET /api/purchases - completed items across accessible lists
pub async fn get_purchases(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PurchasesQuery>,
) -> Result<Json<PurchasesResponse>, AppError> {
    let mut list_ids = state.accessible_list_ids(&auth.id)?;
    if let Some(filter) = query.list_id {
        list_ids.retain(|id| *id == filter);
    }

    let mut views = Vec::new();
    for list_id in list_ids {
        let Some(list) = state.lists.get_list(&list_id)? else {
            continue;
        };
        let owner = state.users.get(&list.owner_id)?.map(|u| u.summary());
        let info = PurchaseListInfo {
            id: list.id,
            name: list.name.clone(),
            owner: owner.clone(),
        };

        for item in state.lists.items_for_list(&list_id)? {
            if !item.completed || item.completed_at.is_none() {
                continue;
            }

            let completed_by = match item.completed_by {
                Some(user_id) => state.users.get(&user_id)?.map(|u| u.summary()),
                None => None,
            }
            .or_else(|| owner.clone());

            views.push(PurchaseView {
                item,
                list: info.clone(),
                completed_by,
            });
        }
    }

    views.sort_by(|a, b| b.item.completed_at.cmp(&a.item.completed_at));

    let mut grouped_by_date: BTreeMap<String, Vec<PurchaseView>> = BTreeMap::new();
    for view in &views {
        if let Some(completed_at) = view.item.completed_at {
            let date = completed_at.format("%Y-%m-%d").to_string();
            grouped_by_date.entry(date).or_default().push(view.clone());
        }
    }

    let total = views.len();
    Ok(Json(PurchasesResponse {
        items: views,
        grouped_by_date,
        total,
    }))
}
