//! Central state manager for the server.
//!
//! Owns every store plus the mailer and hosts the orchestration that spans
//! more than one store: authentication flows, item ingestion with history
//! suggestions, and notification fan-out. Single-store reads go straight
//! through the public store fields.

use anyhow::Context;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth;
use crate::config::ServerConfig;
use crate::email::{Mailer, SendOutcome};
use crate::errors::{AppError, Result, ValidationErrorExt};
use crate::metrics;
use crate::similarity;
use crate::store::types::{
    ItemId, ListAccess, ListId, ListShare, Notification, NotificationId, NotificationKind, Session,
    ShoppingList, ShoppingListItem, User, UserId, UserSummary,
};
use crate::store::{
    ItemHistoryStore, ListStore, NotificationStore, SessionStore, UserStore,
};
use crate::validation;

use super::types::SimilarSuggestion;

/// Central state for the server
pub struct ListManager {
    pub users: UserStore,
    pub lists: ListStore,
    pub history: ItemHistoryStore,
    pub notifications: NotificationStore,
    pub sessions: SessionStore,
    pub mailer: Arc<Mailer>,
    pub config: ServerConfig,
}

impl ListManager {
    pub fn new(storage_path: PathBuf, config: ServerConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&storage_path)
            .with_context(|| format!("Failed to create {}", storage_path.display()))?;

        let manager = Self {
            users: UserStore::new(&storage_path)?,
            lists: ListStore::new(&storage_path)?,
            history: ItemHistoryStore::new(&storage_path)?,
            notifications: NotificationStore::new(&storage_path)?,
            sessions: SessionStore::new(&storage_path, config.session_ttl_days)?,
            mailer: Arc::new(Mailer::new(&config.smtp)?),
            config,
        };

        info!(storage_path = %storage_path.display(), "List manager initialized");
        Ok(manager)
    }

    /// Flush every RocksDB store to disk. Called on shutdown.
    pub fn flush_all(&self) -> anyhow::Result<()> {
        self.users.flush()?;
        self.lists.flush()?;
        self.history.flush()?;
        self.notifications.flush()?;
        self.sessions.flush()?;
        Ok(())
    }

    /// Fire-and-forget email delivery. lettre's sync transport blocks, so
    /// sends run on the blocking pool and only log their outcome.
    fn spawn_email<F>(&self, send: F)
    where
        F: FnOnce(&Mailer) -> anyhow::Result<SendOutcome> + Send + 'static,
    {
        let mailer = self.mailer.clone();
        tokio::task::spawn_blocking(move || match send(&mailer) {
            Ok(SendOutcome::Sent) => {
                metrics::EMAIL_SEND_TOTAL.with_label_values(&["sent"]).inc();
            }
            Ok(SendOutcome::Skipped) => {
                metrics::EMAIL_SEND_TOTAL.with_label_values(&["skipped"]).inc();
            }
            Err(e) => {
                metrics::EMAIL_SEND_TOTAL.with_label_values(&["error"]).inc();
                warn!("Email delivery failed: {e}");
            }
        });
    }

    // =========================================================================
    // AUTHENTICATION
    // =========================================================================

    /// Register a new account and open a session for it.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> Result<(User, Session)> {
        let email = email.trim();
        validation::validate_email(email).map_validation_err("email")?;
        validation::validate_password(password).map_validation_err("password")?;
        if let Some(name) = &name {
            validation::validate_list_name(name).map_validation_err("name")?;
        }

        let password_hash = auth::hash_password(password)?;
        let user = self
            .users
            .create_user(email, name, password_hash)?
            .ok_or_else(|| AppError::EmailAlreadyRegistered(email.to_string()))?;

        let code = auth::generate_verification_code();
        self.users.set_verification_code(&user.id, &code)?;

        let to = user.email.clone();
        let to_name = user.name.clone();
        self.spawn_email(move |mailer| {
            mailer.send_verification_email(&to, to_name.as_deref(), &code)
        });

        let session = self.sessions.create(&user.id)?;
        Ok((user, session))
    }

    pub fn login(&self, email: &str, password: &str) -> Result<(User, Session)> {
        let Some(user) = self.users.find_by_email(email)? else {
            return Err(AppError::InvalidCredentials);
        };

        if !auth::verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        if self.config.require_email_verification && !user.email_verified {
            return Err(AppError::EmailNotVerified);
        }

        let session = self.sessions.create(&user.id)?;
        Ok((user, session))
    }

    /// Confirm an email address with its 6-digit code and open a session.
    pub fn verify_email(&self, email: &str, code: &str) -> Result<(User, Session)> {
        let Some(user) = self.users.find_by_email(email)? else {
            return Err(AppError::UserNotFound(email.to_string()));
        };

        if user.email_verified {
            return Err(AppError::InvalidInput {
                field: "email".to_string(),
                reason: "email already verified".to_string(),
            });
        }

        let Some(pending) = self.users.get_verification_code(&user.id)? else {
            return Err(AppError::InvalidVerificationCode);
        };
        if pending.code != code {
            return Err(AppError::InvalidVerificationCode);
        }
        if Utc::now() > pending.expires_at {
            return Err(AppError::VerificationCodeExpired);
        }

        let user = self
            .users
            .mark_email_verified(&user.id)?
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))?;

        let session = self.sessions.create(&user.id)?;
        Ok((user, session))
    }

    pub fn current_user(&self, user_id: &UserId) -> Result<User> {
        self.users
            .get(user_id)?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    // =========================================================================
    // LIST ACCESS
    // =========================================================================

    /// Fetch a list, requiring at least the given access. Inaccessible and
    /// missing lists are indistinguishable to the caller.
    pub fn require_list_access(
        &self,
        list_id: &ListId,
        user_id: &UserId,
        need_edit: bool,
    ) -> Result<(ShoppingList, ListAccess)> {
        let access = self
            .lists
            .access_for(list_id, user_id)?
            .ok_or_else(|| AppError::ListNotFound(list_id.to_string()))?;

        if need_edit && !access.can_edit() {
            return Err(AppError::ListNotFound(list_id.to_string()));
        }

        let list = self
            .lists
            .get_list(list_id)?
            .ok_or_else(|| AppError::ListNotFound(list_id.to_string()))?;

        Ok((list, access))
    }

    /// Ids of every list the user can see (owned or shared with them).
    pub fn accessible_list_ids(&self, user_id: &UserId) -> Result<Vec<ListId>> {
        let mut ids: Vec<ListId> = self
            .lists
            .lists_for_owner(user_id)?
            .into_iter()
            .map(|l| l.id)
            .collect();
        ids.extend(
            self.lists
                .lists_shared_with(user_id)?
                .into_iter()
                .map(|(l, _)| l.id),
        );
        Ok(ids)
    }

    // =========================================================================
    // ITEM INGESTION
    // =========================================================================

    /// Add an item to a list and return it together with the most similar
    /// history entry, if any.
    ///
    /// The suggestion is computed from history fetched BEFORE this item's
    /// own upsert, so a new item can never match itself. A failed item write
    /// aborts before the history update; a failed history update after a
    /// successful item write is logged and swallowed (history is a soft
    /// hint, not authoritative).
    ///
    /// The caller must have checked edit access to `list_id` already.
    pub fn add_item(
        &self,
        user_id: &UserId,
        list_id: &ListId,
        raw_name: &str,
        quantity: Option<String>,
        characteristics: Option<String>,
    ) -> Result<(ShoppingListItem, Option<SimilarSuggestion>)> {
        validation::validate_item_name(raw_name).map_validation_err("name")?;
        if let Some(q) = &quantity {
            validation::validate_free_text(q).map_validation_err("quantity")?;
        }
        if let Some(c) = &characteristics {
            validation::validate_free_text(c).map_validation_err("characteristics")?;
        }

        let normalized_name = similarity::normalize_name(raw_name);

        let history = self.history.for_user(user_id)?;
        let suggestion = similarity::best_history_match(&normalized_name, &history).map(|entry| {
            SimilarSuggestion {
                name: entry.item_name.clone(),
                last_added_at: entry.last_added_at,
            }
        });
        let outcome = if suggestion.is_some() { "hit" } else { "miss" };
        metrics::SUGGESTION_TOTAL.with_label_values(&[outcome]).inc();

        let item = ShoppingListItem {
            id: ItemId::new(),
            list_id: *list_id,
            name: raw_name.to_string(),
            quantity,
            characteristics,
            completed: false,
            completed_at: None,
            completed_by: None,
            created_at: Utc::now(),
        };

        if let Err(e) = self.lists.create_item(&item) {
            metrics::ITEM_INGEST_TOTAL.with_label_values(&["error"]).inc();
            return Err(AppError::StorageError(e.to_string()));
        }

        if let Err(e) = self.history.upsert(user_id, &normalized_name) {
            warn!(
                user_id = %user_id,
                item_name = %normalized_name,
                "History update failed after item creation: {e}"
            );
        }

        metrics::ITEM_INGEST_TOTAL.with_label_values(&["success"]).inc();
        Ok((item, suggestion))
    }

    // =========================================================================
    // SHARING & NOTIFICATION FAN-OUT
    // =========================================================================

    /// Share a list with another user by email. Owner only. Notifies the
    /// target in-app and, best effort, by email.
    pub fn share_list(
        &self,
        owner_id: &UserId,
        list_id: &ListId,
        email: &str,
        can_edit: bool,
    ) -> Result<(ListShare, UserSummary)> {
        validation::validate_email(email).map_validation_err("email")?;

        let list = self
            .lists
            .get_list(list_id)?
            .filter(|l| l.owner_id == *owner_id)
            .ok_or_else(|| AppError::ListNotFound(list_id.to_string()))?;

        let Some(target) = self.users.find_by_email(email)? else {
            return Err(AppError::UserNotFound(email.to_string()));
        };

        if target.id == *owner_id {
            return Err(AppError::InvalidInput {
                field: "email".to_string(),
                reason: "cannot share a list with yourself".to_string(),
            });
        }

        let share = ListShare {
            list_id: *list_id,
            user_id: target.id,
            can_edit,
            created_at: Utc::now(),
        };
        if !self.lists.add_share(&share)? {
            return Err(AppError::ListAlreadyShared {
                list_id: list_id.to_string(),
                email: target.email.clone(),
            });
        }

        let sender = self.current_user(owner_id)?;
        let title = "List shared".to_string();
        let message = format!(
            "{} shared the list \"{}\" with you",
            sender.display_name(),
            list.name
        );
        self.notify(&sender, &target, NotificationKind::ListShared, &title, &message, Some(list_id));

        let to = target.email.clone();
        let to_name = target.name.clone();
        let list_name = list.name.clone();
        self.spawn_email(move |mailer| {
            mailer.send_notification_email(&to, to_name.as_deref(), &title, &message, Some(&list_name))
        });

        Ok((share, target.summary()))
    }

    /// Announce "going shopping" to every collaborator on the list except the
    /// sender. Returns the number of notifications created.
    pub fn send_shopping_alert(
        &self,
        sender_id: &UserId,
        list_id: &ListId,
        message: Option<String>,
    ) -> Result<usize> {
        if let Some(m) = &message {
            validation::validate_free_text(m).map_validation_err("message")?;
        }

        // Any collaborator may announce, viewers included
        let (list, _access) = self.require_list_access(list_id, sender_id, false)?;
        let sender = self.current_user(sender_id)?;

        let mut recipient_ids: Vec<UserId> = self
            .lists
            .shares_for_list(list_id)?
            .into_iter()
            .map(|s| s.user_id)
            .collect();
        if list.owner_id != *sender_id {
            recipient_ids.push(list.owner_id);
        }
        recipient_ids.retain(|id| id != sender_id);

        if recipient_ids.is_empty() {
            return Err(AppError::NoRecipients);
        }

        let title = "Going shopping!".to_string();
        let message = message.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| {
            format!(
                "{} is going shopping. Need anything from the list \"{}\"?",
                sender.display_name(),
                list.name
            )
        });

        let mut count = 0;
        for recipient_id in recipient_ids {
            let Some(recipient) = self.users.get(&recipient_id)? else {
                continue;
            };

            self.notify(
                &sender,
                &recipient,
                NotificationKind::ShoppingAlert,
                &title,
                &message,
                Some(list_id),
            );
            count += 1;

            let to = recipient.email.clone();
            let to_name = recipient.name.clone();
            let title = title.clone();
            let message = message.clone();
            let list_name = list.name.clone();
            self.spawn_email(move |mailer| {
                mailer.send_notification_email(
                    &to,
                    to_name.as_deref(),
                    &title,
                    &message,
                    Some(&list_name),
                )
            });
        }

        Ok(count)
    }

    /// Persist an in-app notification; failures are logged, never surfaced.
    fn notify(
        &self,
        sender: &User,
        receiver: &User,
        kind: NotificationKind,
        title: &str,
        message: &str,
        list_id: Option<&ListId>,
    ) {
        let notification = Notification {
            id: NotificationId::new(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            sender_id: sender.id,
            receiver_id: receiver.id,
            list_id: list_id.copied(),
            read: false,
            created_at: Utc::now(),
        };

        match self.notifications.create(&notification) {
            Ok(()) => {
                let kind_label = match kind {
                    NotificationKind::ListShared => "list_shared",
                    NotificationKind::ShoppingAlert => "shopping_alert",
                };
                metrics::NOTIFICATION_FANOUT_TOTAL
                    .with_label_values(&[kind_label])
                    .inc();
            }
            Err(e) => warn!(receiver_id = %receiver.id, "Failed to store notification: {e}"),
        }
    }
}
