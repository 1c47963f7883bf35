//! DTOs shared by more than one handler module

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::types::{ListShare, ShoppingList, ShoppingListItem, UserSummary};

/// A history-based "you bought this before" hint returned alongside a newly
/// created item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarSuggestion {
    /// Normalized name as stored in history
    pub name: String,
    pub last_added_at: DateTime<Utc>,
}

/// A share as presented to clients: the grant plus who it is for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareView {
    pub user: UserSummary,
    pub can_edit: bool,
    pub created_at: DateTime<Utc>,
}

impl ShareView {
    pub fn new(share: ListShare, user: UserSummary) -> Self {
        Self {
            user,
            can_edit: share.can_edit,
            created_at: share.created_at,
        }
    }
}

/// A list with everything its page needs: items, owner, and shares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListView {
    #[serde(flatten)]
    pub list: ShoppingList,
    pub items: Vec<ShoppingListItem>,
    pub owner: Option<UserSummary>,
    pub shared_with: Vec<ShareView>,
}
