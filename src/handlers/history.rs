//! Item history handler: what the user has bought, how often, how recently.

use axum::{extract::State, Extension, Json};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::store::types::ItemHistoryEntry;

use super::AppState;

/// GET /api/history - up to 100 entries, most recent first, frequency as the
/// tie-break
pub async fn get_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ItemHistoryEntry>>, AppError> {
    let entries = state.history.recent_for_user(&auth.id)?;
    Ok(Json(entries))
}
