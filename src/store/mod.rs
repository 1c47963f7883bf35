//! Embedded persistence layer. One RocksDB per concern, JSON values,
//! prefix iteration for per-user and per-list scans.

pub mod history;
pub mod lists;
pub mod notifications;
pub mod sessions;
pub mod types;
pub mod users;

pub use history::{ItemHistoryStore, HISTORY_LIST_LIMIT};
pub use lists::ListStore;
pub use notifications::{NotificationStore, NOTIFICATION_LIST_LIMIT};
pub use sessions::SessionStore;
pub use users::UserStore;
