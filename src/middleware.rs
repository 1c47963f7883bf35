//! HTTP request tracking middleware for observability

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Middleware to track HTTP request latency and counts
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();
    let normalized_path = normalize_path(&path);

    crate::metrics::HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &normalized_path, &status])
        .observe(duration);

    crate::metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &normalized_path, &status])
        .inc();

    response
}

/// Normalize path to prevent metric cardinality explosion:
/// /api/lists/3f8a…/items/91bc… -> /api/lists/{id}/items/{id}
fn normalize_path(path: &str) -> String {
    let mut normalized = Vec::new();

    for part in path.split('/') {
        if part.is_empty() {
            continue;
        }
        if is_id(part) {
            normalized.push("{id}");
        } else {
            normalized.push(part);
        }
    }

    format!("/{}", normalized.join("/"))
}

/// Check if a path segment looks like an id (UUID or numeric)
fn is_id(segment: &str) -> bool {
    if segment.contains('-') && segment.len() >= 32 {
        return true;
    }

    !segment.is_empty() && segment.chars().all(|c| c.is_numeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("/api/lists/550e8400-e29b-41d4-a716-446655440000/items"),
            "/api/lists/{id}/items"
        );
        assert_eq!(
            normalize_path(
                "/api/lists/550e8400-e29b-41d4-a716-446655440000/items/6ba7b810-9dad-11d1-80b4-00c04fd430c8"
            ),
            "/api/lists/{id}/items/{id}"
        );
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/api/notifications/42/read"), "/api/notifications/{id}/read");
    }
}
