//! Domain records shared across stores and handlers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

id_type!(UserId);
id_type!(ListId);
id_type!(ItemId);
id_type!(NotificationId);

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    /// Argon2 PHC string, never serialized to clients (see [`UserSummary`])
    pub password_hash: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name falling back to the email address
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Client-safe projection of a user (id, email, name)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
}

/// Pending email verification code for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    pub user_id: UserId,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// A shopping list owned by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: ListId,
    pub name: String,
    pub description: Option<String>,
    /// Preferred store/shop for this list
    pub store: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An item on a shopping list. `name` keeps the user's original spelling;
/// normalization happens only on the history key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub id: ItemId,
    pub list_id: ListId,
    pub name: String,
    pub quantity: Option<String>,
    pub characteristics: Option<String>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Grant of access to a list for a non-owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListShare {
    pub list_id: ListId,
    pub user_id: UserId,
    pub can_edit: bool,
    pub created_at: DateTime<Utc>,
}

/// What a user may do with a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAccess {
    Owner,
    /// Shared with can_edit = true
    Editor,
    /// Shared with can_edit = false
    Viewer,
}

impl ListAccess {
    pub fn can_edit(self) -> bool {
        matches!(self, ListAccess::Owner | ListAccess::Editor)
    }
}

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A list was shared with the receiver
    ListShared,
    /// A collaborator announced they are going shopping
    ShoppingAlert,
}

/// A persisted notification for one receiver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub list_id: Option<ListId>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-user record of how often and how recently a normalized item name was
/// added to any list. Exactly one entry exists per (user, normalized name);
/// `times_added` only grows and `last_added_at` never moves backward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemHistoryEntry {
    pub user_id: UserId,
    /// Normalized (lowercased, trimmed) item name, the lookup key
    pub item_name: String,
    pub last_added_at: DateTime<Utc>,
    pub times_added: u64,
}

/// An authenticated session, keyed by its opaque token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
