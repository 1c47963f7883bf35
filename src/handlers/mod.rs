//! HTTP API handlers, organized by domain.

// Core modules
pub mod router;
pub mod state;
pub mod types;

// Health and metrics
pub mod health;

// Authentication and sessions
pub mod auth;

// Lists, items, and purchase history
pub mod history;
pub mod items;
pub mod lists;
pub mod purchases;

// Notifications
pub mod notifications;

// Test utilities (compiled only in test builds)
#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used items
pub use router::{build_protected_routes, build_public_routes, build_router, AppState};
pub use state::ListManager;
pub use types::*;
