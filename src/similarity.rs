//! Textual similarity between a new item name and the user's purchase history
//!
//! The heuristic is substring containment in either direction: "milk" matches
//! "whole milk" and "whole milk" matches "milk". History arrives ordered by
//! recency, so the first hit is the user's most recent plausible match and the
//! most actionable one to surface.

use crate::store::types::ItemHistoryEntry;

/// Normalize an item name into its history key (lowercased, trimmed).
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Find the history entry most likely to be the same product as
/// `normalized_name`.
///
/// `history` must be ordered `last_added_at` descending; the scan returns the
/// first entry whose lowercased name contains `normalized_name` or is
/// contained by it. Callers must reject empty names upstream: an empty needle
/// would match every entry.
pub fn best_history_match<'a>(
    normalized_name: &str,
    history: &'a [ItemHistoryEntry],
) -> Option<&'a ItemHistoryEntry> {
    debug_assert!(!normalized_name.is_empty());

    history.iter().find(|entry| {
        let history_name = entry.item_name.to_lowercase();
        history_name.contains(normalized_name) || normalized_name.contains(&history_name)
    })
}
