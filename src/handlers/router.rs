//! Router configuration - centralized route definitions.
//!
//! Routes are split into public (no auth) and protected (session required).
//! The session middleware is applied here so both the binary and the test
//! harness get the same surface.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::auth::session_auth;

use super::state::ListManager;
use super::{auth, health, history, items, lists, notifications, purchases};

/// Application state type alias
pub type AppState = Arc<ListManager>;

/// Build the public routes (no authentication required)
///
/// Health checks, metrics scraping, and the flows that establish a session.
pub fn build_public_routes(state: AppState) -> Router {
    Router::new()
        // =================================================================
        // HEALTH & METRICS
        // =================================================================
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics_handler))
        // =================================================================
        // AUTHENTICATION ENTRY POINTS
        // =================================================================
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify-email", post(auth::verify_email))
        .with_state(state)
}

/// Build the protected API routes (session required)
pub fn build_protected_routes(state: AppState) -> Router {
    Router::new()
        // =================================================================
        // SESSION
        // =================================================================
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        // =================================================================
        // LISTS & SHARING
        // =================================================================
        .route("/api/lists", get(lists::list_lists))
        .route("/api/lists", post(lists::create_list))
        .route("/api/lists/{id}", get(lists::get_list))
        .route("/api/lists/{id}", put(lists::update_list))
        .route("/api/lists/{id}", delete(lists::delete_list))
        .route("/api/lists/{id}/share", post(lists::share_list))
        // =================================================================
        // ITEMS
        // =================================================================
        .route("/api/lists/{id}/items", post(items::create_item))
        .route("/api/lists/{id}/items/{item_id}", put(items::update_item))
        .route(
            "/api/lists/{id}/items/{item_id}",
            delete(items::delete_item),
        )
        // =================================================================
        // HISTORY & PURCHASES
        // =================================================================
        .route("/api/history", get(history::get_history))
        .route("/api/purchases", get(purchases::get_purchases))
        // =================================================================
        // NOTIFICATIONS
        // =================================================================
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/{id}/read",
            post(notifications::mark_notification_read),
        )
        .route(
            "/api/notifications/send",
            post(notifications::send_shopping_alert),
        )
        .layer(middleware::from_fn_with_state(state.clone(), session_auth))
        .with_state(state)
}

/// Build the complete router with all routes
pub fn build_router(state: AppState) -> Router {
    let public = build_public_routes(state.clone());
    let protected = build_protected_routes(state);

    Router::new().merge(public).merge(protected)
}
