//! Notification handlers: inbox listing, read receipts, shopping alerts.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::store::types::{ListId, Notification, NotificationId, UserSummary};

use super::AppState;

/// One notification with its sender resolved
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub sender: Option<UserSummary>,
}

/// Response for GET /api/notifications
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationView>,
    pub unread_count: usize,
}

/// GET /api/notifications - newest first, capped, plus the unread count
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<NotificationsResponse>, AppError> {
    let mut notifications = Vec::new();
    for notification in state.notifications.list_for_receiver(&auth.id)? {
        let sender = state.users.get(&notification.sender_id)?.map(|u| u.summary());
        notifications.push(NotificationView {
            notification,
            sender,
        });
    }

    let unread_count = state.notifications.unread_count(&auth.id)?;

    Ok(Json(NotificationsResponse {
        notifications,
        unread_count,
    }))
}

/// Response for POST /api/notifications/{id}/read
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub message: String,
}

/// POST /api/notifications/{id}/read - mark one of the user's notifications read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(notification_id): Path<NotificationId>,
) -> Result<Json<MarkReadResponse>, AppError> {
    if !state.notifications.mark_read(&auth.id, &notification_id)? {
        return Err(AppError::NotificationNotFound(notification_id.to_string()));
    }

    Ok(Json(MarkReadResponse {
        message: "Notification marked as read".to_string(),
    }))
}

/// Request to announce a shopping trip to a list's collaborators
#[derive(Debug, Deserialize)]
pub struct SendAlertRequest {
    pub list_id: ListId,
    pub message: Option<String>,
}

/// Response for POST /api/notifications/send
#[derive(Debug, Serialize, Deserialize)]
pub struct SendAlertResponse {
    pub message: String,
    pub count: usize,
}

/// POST /api/notifications/send - notify everyone else on the list
pub async fn send_shopping_alert(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SendAlertRequest>,
) -> Result<Json<SendAlertResponse>, AppError> {
    let count = state.send_shopping_alert(&auth.id, &req.list_id, req.message)?;

    Ok(Json(SendAlertResponse {
        message: format!("Notified {count} collaborator(s)"),
        count,
    }))
}
