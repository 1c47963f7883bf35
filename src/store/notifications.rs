//! Per-receiver notification storage.
//!
//! Keys are `{receiver_id}:{inverted_nanos}:{notification_id}` so a forward
//! prefix scan yields newest notifications first without sorting.

use anyhow::{Context, Result};
use rocksdb::{IteratorMode, Options, DB};
use std::path::Path;
use std::sync::Arc;

use super::types::{Notification, NotificationId, UserId};

/// How many notifications the listing returns at most
pub const NOTIFICATION_LIST_LIMIT: usize = 50;

/// Storage for user notifications
pub struct NotificationStore {
    db: Arc<DB>,
}

impl NotificationStore {
    pub fn new(storage_path: &Path) -> Result<Self> {
        let path = storage_path.join("notifications");
        std::fs::create_dir_all(&path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = Arc::new(DB::open(&opts, &path).context("Failed to open notifications DB")?);

        tracing::info!("Notification store initialized");

        Ok(Self { db })
    }

    fn key(notification: &Notification) -> String {
        // Inverted timestamp gives newest-first iteration order
        let nanos = notification
            .created_at
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .clamp(0, i64::MAX);
        let inverted = i64::MAX - nanos;
        format!(
            "{}:{:020}:{}",
            notification.receiver_id, inverted, notification.id
        )
    }

    pub fn create(&self, notification: &Notification) -> Result<()> {
        let value =
            serde_json::to_vec(notification).context("Failed to serialize notification")?;
        self.db
            .put(Self::key(notification).as_bytes(), &value)
            .context("Failed to store notification")?;

        tracing::debug!(
            notification_id = %notification.id,
            receiver_id = %notification.receiver_id,
            kind = ?notification.kind,
            "Created notification"
        );
        Ok(())
    }

    fn scan_for_receiver(&self, receiver_id: &UserId) -> Result<Vec<(Vec<u8>, Notification)>> {
        let prefix = format!("{}:", receiver_id);
        let mut out = Vec::new();
        let iter = self.db.iterator(IteratorMode::From(
            prefix.as_bytes(),
            rocksdb::Direction::Forward,
        ));
        for result in iter {
            let (key, value) = result.context("Notification iterator error")?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let notification: Notification =
                serde_json::from_slice(&value).context("Failed to deserialize notification")?;
            out.push((key.to_vec(), notification));
        }
        Ok(out)
    }

    /// Most recent notifications for a receiver, newest first.
    pub fn list_for_receiver(&self, receiver_id: &UserId) -> Result<Vec<Notification>> {
        Ok(self
            .scan_for_receiver(receiver_id)?
            .into_iter()
            .map(|(_, n)| n)
            .take(NOTIFICATION_LIST_LIMIT)
            .collect())
    }

    /// Count unread notifications across the receiver's whole history.
    pub fn unread_count(&self, receiver_id: &UserId) -> Result<usize> {
        Ok(self
            .scan_for_receiver(receiver_id)?
            .iter()
            .filter(|(_, n)| !n.read)
            .count())
    }

    /// Mark a notification as read. Returns `false` when no notification with
    /// that id exists for this receiver.
    pub fn mark_read(&self, receiver_id: &UserId, id: &NotificationId) -> Result<bool> {
        for (key, mut notification) in self.scan_for_receiver(receiver_id)? {
            if notification.id == *id {
                notification.read = true;
                let value = serde_json::to_vec(&notification)
                    .context("Failed to serialize notification")?;
                self.db
                    .put(&key, &value)
                    .context("Failed to update notification")?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("Failed to flush notifications DB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::NotificationKind;
    use chrono::Utc;

    fn notification(receiver: UserId, title: &str) -> Notification {
        Notification {
            id: NotificationId::new(),
            kind: NotificationKind::ShoppingAlert,
            title: title.to_string(),
            message: "msg".to_string(),
            sender_id: UserId::new(),
            receiver_id: receiver,
            list_id: None,
            read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_newest_first_and_receiver_isolation() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = NotificationStore::new(dir.path()).unwrap();
        let alice = UserId::new();
        let bob = UserId::new();

        store.create(&notification(alice, "first")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.create(&notification(alice, "second")).unwrap();
        store.create(&notification(bob, "other")).unwrap();

        let listed = store.list_for_receiver(&alice).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "second");
        assert_eq!(listed[1].title, "first");
    }

    #[test]
    fn test_unread_count_and_mark_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = NotificationStore::new(dir.path()).unwrap();
        let alice = UserId::new();

        let n = notification(alice, "hi");
        store.create(&n).unwrap();
        store.create(&notification(alice, "hi again")).unwrap();
        assert_eq!(store.unread_count(&alice).unwrap(), 2);

        assert!(store.mark_read(&alice, &n.id).unwrap());
        assert_eq!(store.unread_count(&alice).unwrap(), 1);

        // Wrong receiver cannot mark it
        assert!(!store.mark_read(&UserId::new(), &n.id).unwrap());
    }
}
