//! Health and metrics endpoints. Both are unauthenticated.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::metrics;

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "spesa",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /metrics - Prometheus exposition format
pub async fn metrics_handler() -> impl IntoResponse {
    (StatusCode::OK, metrics::gather())
}
