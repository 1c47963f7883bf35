//! Account storage: users, the email lookup index, and pending
//! email-verification codes.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use rocksdb::{Options, DB};
use std::path::Path;
use std::sync::Arc;

use super::types::{User, UserId, VerificationCode};

/// Verification codes are valid for 24 hours
const VERIFICATION_CODE_TTL_HOURS: i64 = 24;

/// Storage for registered accounts
pub struct UserStore {
    /// key = {user_id}
    user_db: Arc<DB>,
    /// key = normalized email, value = user_id
    email_db: Arc<DB>,
    /// key = {user_id}, value = pending verification code
    code_db: Arc<DB>,
    /// Serializes email uniqueness check-then-insert
    create_lock: Mutex<()>,
}

impl UserStore {
    pub fn new(storage_path: &Path) -> Result<Self> {
        let path = storage_path.join("users");
        std::fs::create_dir_all(&path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let user_db =
            Arc::new(DB::open(&opts, path.join("accounts")).context("Failed to open users DB")?);
        let email_db =
            Arc::new(DB::open(&opts, path.join("emails")).context("Failed to open email index DB")?);
        let code_db = Arc::new(
            DB::open(&opts, path.join("codes")).context("Failed to open verification codes DB")?,
        );

        tracing::info!("User store initialized");

        Ok(Self {
            user_db,
            email_db,
            code_db,
            create_lock: Mutex::new(()),
        })
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Create a user. Returns `None` when the email is already registered.
    pub fn create_user(
        &self,
        email: &str,
        name: Option<String>,
        password_hash: String,
    ) -> Result<Option<User>> {
        let email_key = Self::normalize_email(email);

        let _guard = self.create_lock.lock();

        if self.email_db.get(email_key.as_bytes())?.is_some() {
            return Ok(None);
        }

        let user = User {
            id: UserId::new(),
            email: email_key.clone(),
            name,
            password_hash,
            email_verified: false,
            created_at: Utc::now(),
        };

        let value = serde_json::to_vec(&user).context("Failed to serialize user")?;
        self.user_db
            .put(user.id.to_string().as_bytes(), &value)
            .context("Failed to store user")?;
        self.email_db
            .put(email_key.as_bytes(), user.id.to_string().as_bytes())
            .context("Failed to store email index")?;

        tracing::info!(user_id = %user.id, "Registered new user");

        Ok(Some(user))
    }

    pub fn get(&self, user_id: &UserId) -> Result<Option<User>> {
        match self.user_db.get(user_id.to_string().as_bytes())? {
            Some(bytes) => {
                let user = serde_json::from_slice(&bytes).context("Failed to deserialize user")?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email_key = Self::normalize_email(email);
        let Some(id_bytes) = self.email_db.get(email_key.as_bytes())? else {
            return Ok(None);
        };
        let id_str = String::from_utf8(id_bytes.to_vec()).context("Corrupt email index entry")?;
        let user_id: UserId = id_str.parse().context("Corrupt email index entry")?;
        self.get(&user_id)
    }

    fn put_user(&self, user: &User) -> Result<()> {
        let value = serde_json::to_vec(user).context("Failed to serialize user")?;
        self.user_db
            .put(user.id.to_string().as_bytes(), &value)
            .context("Failed to store user")?;
        Ok(())
    }

    /// Store a fresh verification code for the user, replacing any pending one.
    pub fn set_verification_code(&self, user_id: &UserId, code: &str) -> Result<VerificationCode> {
        let record = VerificationCode {
            user_id: *user_id,
            code: code.to_string(),
            expires_at: Utc::now() + Duration::hours(VERIFICATION_CODE_TTL_HOURS),
        };

        let value = serde_json::to_vec(&record).context("Failed to serialize verification code")?;
        self.code_db
            .put(user_id.to_string().as_bytes(), &value)
            .context("Failed to store verification code")?;

        Ok(record)
    }

    pub fn get_verification_code(&self, user_id: &UserId) -> Result<Option<VerificationCode>> {
        match self.code_db.get(user_id.to_string().as_bytes())? {
            Some(bytes) => {
                let code = serde_json::from_slice(&bytes)
                    .context("Failed to deserialize verification code")?;
                Ok(Some(code))
            }
            None => Ok(None),
        }
    }

    /// Mark the user's email as verified and clear the pending code.
    pub fn mark_email_verified(&self, user_id: &UserId) -> Result<Option<User>> {
        let Some(mut user) = self.get(user_id)? else {
            return Ok(None);
        };
        user.email_verified = true;
        self.put_user(&user)?;
        self.code_db
            .delete(user_id.to_string().as_bytes())
            .context("Failed to clear verification code")?;
        Ok(Some(user))
    }

    pub fn flush(&self) -> Result<()> {
        self.user_db.flush().context("Failed to flush user DB")?;
        self.email_db.flush().context("Failed to flush email index DB")?;
        self.code_db
            .flush()
            .context("Failed to flush verification code DB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (UserStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (UserStore::new(dir.path()).unwrap(), dir)
    }

    #[test]
    fn test_create_and_lookup() {
        let (store, _dir) = store();

        let user = store
            .create_user("Alice@Example.com", Some("Alice".to_string()), "hash".to_string())
            .unwrap()
            .unwrap();

        // Emails are normalized on the way in
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.email_verified);

        let by_id = store.get(&user.id).unwrap().unwrap();
        assert_eq!(by_id.email, user.email);

        let by_email = store.find_by_email("ALICE@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (store, _dir) = store();

        store
            .create_user("a@b.it", None, "hash1".to_string())
            .unwrap()
            .unwrap();
        let dup = store.create_user("a@b.it", None, "hash2".to_string()).unwrap();
        assert!(dup.is_none());
    }

    #[test]
    fn test_verification_flow() {
        let (store, _dir) = store();

        let user = store
            .create_user("a@b.it", None, "hash".to_string())
            .unwrap()
            .unwrap();

        store.set_verification_code(&user.id, "123456").unwrap();
        let code = store.get_verification_code(&user.id).unwrap().unwrap();
        assert_eq!(code.code, "123456");
        assert!(code.expires_at > Utc::now());

        let verified = store.mark_email_verified(&user.id).unwrap().unwrap();
        assert!(verified.email_verified);
        assert!(store.get_verification_code(&user.id).unwrap().is_none());
    }
}
