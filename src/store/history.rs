//! Per-user item history: how often and how recently each normalized item
//! name has been added to any list.
//!
//! Entries are never deleted; the read path caps what it returns. Upserts go
//! through a read-modify-write cycle, so they are serialized behind a mutex
//! to guarantee concurrent adds of the same name never lose an increment.

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rocksdb::{IteratorMode, Options, DB};
use std::path::Path;
use std::sync::Arc;

use super::types::{ItemHistoryEntry, UserId};

/// How many entries the history listing returns at most
pub const HISTORY_LIST_LIMIT: usize = 100;

/// Storage for per-user item history
pub struct ItemHistoryStore {
    /// key = {user_id}:{normalized_name}
    db: Arc<DB>,
    /// Serializes upsert read-modify-write cycles (no lost increments)
    upsert_lock: Mutex<()>,
}

impl ItemHistoryStore {
    pub fn new(storage_path: &Path) -> Result<Self> {
        let path = storage_path.join("item_history");
        std::fs::create_dir_all(&path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = Arc::new(DB::open(&opts, &path).context("Failed to open item history DB")?);

        tracing::info!("Item history store initialized");

        Ok(Self {
            db,
            upsert_lock: Mutex::new(()),
        })
    }

    fn key(user_id: &UserId, normalized_name: &str) -> String {
        format!("{}:{}", user_id, normalized_name)
    }

    /// Record one occurrence of `normalized_name` for `user_id`.
    ///
    /// Creates the entry with `times_added = 1` on first sight, otherwise
    /// increments the counter and bumps `last_added_at`. The timestamp never
    /// moves backward even if the wall clock does.
    pub fn upsert(&self, user_id: &UserId, normalized_name: &str) -> Result<ItemHistoryEntry> {
        let key = Self::key(user_id, normalized_name);
        let now = Utc::now();

        let _guard = self.upsert_lock.lock();

        let entry = match self.db.get(key.as_bytes())? {
            Some(bytes) => {
                let mut entry: ItemHistoryEntry = serde_json::from_slice(&bytes)
                    .context("Failed to deserialize history entry")?;
                entry.times_added += 1;
                entry.last_added_at = entry.last_added_at.max(now);
                entry
            }
            None => ItemHistoryEntry {
                user_id: *user_id,
                item_name: normalized_name.to_string(),
                last_added_at: now,
                times_added: 1,
            },
        };

        let value = serde_json::to_vec(&entry).context("Failed to serialize history entry")?;
        self.db
            .put(key.as_bytes(), &value)
            .context("Failed to store history entry")?;

        tracing::debug!(
            user_id = %user_id,
            item_name = %normalized_name,
            times_added = entry.times_added,
            "Recorded item occurrence"
        );

        Ok(entry)
    }

    /// All history entries for a user, most recently added first
    /// (ties broken by frequency).
    pub fn for_user(&self, user_id: &UserId) -> Result<Vec<ItemHistoryEntry>> {
        let prefix = format!("{}:", user_id);
        let mut entries = Vec::new();

        let iter = self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), rocksdb::Direction::Forward));

        for result in iter {
            let (key, value) = result.context("History iterator error")?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let entry: ItemHistoryEntry =
                serde_json::from_slice(&value).context("Failed to deserialize history entry")?;
            entries.push(entry);
        }

        entries.sort_by(|a, b| {
            b.last_added_at
                .cmp(&a.last_added_at)
                .then(b.times_added.cmp(&a.times_added))
        });

        Ok(entries)
    }

    /// Recent history page for the `/api/history` endpoint.
    pub fn recent_for_user(&self, user_id: &UserId) -> Result<Vec<ItemHistoryEntry>> {
        let mut entries = self.for_user(user_id)?;
        entries.truncate(HISTORY_LIST_LIMIT);
        Ok(entries)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("Failed to flush item history DB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use tempfile::TempDir;

    fn store() -> (ItemHistoryStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (ItemHistoryStore::new(dir.path()).unwrap(), dir)
    }

    #[test]
    fn test_first_upsert_creates_entry() {
        let (store, _dir) = store();
        let user = UserId::new();

        let entry = store.upsert(&user, "latte").unwrap();
        assert_eq!(entry.times_added, 1);
        assert_eq!(entry.item_name, "latte");
    }

    #[test]
    fn test_repeat_upsert_increments_instead_of_duplicating() {
        let (store, _dir) = store();
        let user = UserId::new();

        store.upsert(&user, "latte").unwrap();
        let second = store.upsert(&user, "latte").unwrap();
        assert_eq!(second.times_added, 2);

        let entries = store.for_user(&user).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].times_added, 2);
    }

    #[test]
    fn test_last_added_at_is_monotonic() {
        let (store, _dir) = store();
        let user = UserId::new();

        let first = store.upsert(&user, "pane").unwrap();
        let second = store.upsert(&user, "pane").unwrap();
        assert!(second.last_added_at >= first.last_added_at);
    }

    #[test]
    fn test_users_are_isolated() {
        let (store, _dir) = store();
        let alice = UserId::new();
        let bob = UserId::new();

        store.upsert(&alice, "latte").unwrap();
        assert!(store.for_user(&bob).unwrap().is_empty());
    }

    #[test]
    fn test_recency_ordering() {
        let (store, _dir) = store();
        let user = UserId::new();

        store.upsert(&user, "pane").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.upsert(&user, "latte").unwrap();

        let entries = store.for_user(&user).unwrap();
        assert_eq!(entries[0].item_name, "latte");
        assert_eq!(entries[1].item_name, "pane");
    }

    #[test]
    fn test_concurrent_upserts_lose_no_increment() {
        let (store, _dir) = store();
        let store = StdArc::new(store);
        let user = UserId::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..25 {
                    store.upsert(&user, "latte").unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = store.for_user(&user).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].times_added, 200);
    }
}
