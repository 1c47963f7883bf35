//! Session token storage. Tokens are opaque UUIDs; expired sessions are
//! removed lazily when they are next seen.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rocksdb::{Options, DB};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{Session, UserId};

/// Storage for authenticated sessions
pub struct SessionStore {
    /// key = token
    db: Arc<DB>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(storage_path: &Path, ttl_days: i64) -> Result<Self> {
        let path = storage_path.join("sessions");
        std::fs::create_dir_all(&path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = Arc::new(DB::open(&opts, &path).context("Failed to open sessions DB")?);

        tracing::info!(ttl_days, "Session store initialized");

        Ok(Self {
            db,
            ttl: Duration::days(ttl_days),
        })
    }

    /// Create a fresh session for the user and return it.
    pub fn create(&self, user_id: &UserId) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id: *user_id,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let value = serde_json::to_vec(&session).context("Failed to serialize session")?;
        self.db
            .put(session.token.as_bytes(), &value)
            .context("Failed to store session")?;

        tracing::debug!(user_id = %user_id, "Created session");
        Ok(session)
    }

    /// Resolve a token to its session, deleting it when expired.
    pub fn get(&self, token: &str) -> Result<Option<Session>> {
        let Some(bytes) = self.db.get(token.as_bytes())? else {
            return Ok(None);
        };
        let session: Session =
            serde_json::from_slice(&bytes).context("Failed to deserialize session")?;

        if session.is_expired() {
            self.db
                .delete(token.as_bytes())
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    pub fn delete(&self, token: &str) -> Result<()> {
        self.db
            .delete(token.as_bytes())
            .context("Failed to delete session")?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("Failed to flush sessions DB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_get_delete() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SessionStore::new(dir.path(), 7).unwrap();
        let user = UserId::new();

        let session = store.create(&user).unwrap();
        let resolved = store.get(&session.token).unwrap().unwrap();
        assert_eq!(resolved.user_id, user);

        store.delete(&session.token).unwrap();
        assert!(store.get(&session.token).unwrap().is_none());
    }

    #[test]
    fn test_unknown_token() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SessionStore::new(dir.path(), 7).unwrap();
        assert!(store.get("not-a-token").unwrap().is_none());
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let dir = tempfile::TempDir::new().unwrap();
        // Zero-day TTL expires immediately
        let store = SessionStore::new(dir.path(), 0).unwrap();
        let session = store.create(&UserId::new()).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(store.get(&session.token).unwrap().is_none());
    }
}
