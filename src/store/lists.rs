//! Shopping list storage: lists, their items, and the shares granting other
//! users access.
//!
//! Key schemas:
//! - lists:   `{list_id}`
//! - items:   `{list_id}:{item_id}`
//! - shares:  `{list_id}:{user_id}`
//! - indexes: `owner:{user_id}:{list_id}` and `member:{user_id}:{list_id}`

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

use super::types::{ItemId, ListAccess, ListId, ListShare, ShoppingList, ShoppingListItem, UserId};

/// Storage for shopping lists, items, and shares
pub struct ListStore {
    list_db: Arc<DB>,
    item_db: Arc<DB>,
    share_db: Arc<DB>,
    index_db: Arc<DB>,
    /// Serializes share uniqueness check-then-insert
    share_lock: Mutex<()>,
}

impl ListStore {
    pub fn new(storage_path: &Path) -> Result<Self> {
        let path = storage_path.join("lists");
        std::fs::create_dir_all(&path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let list_db =
            Arc::new(DB::open(&opts, path.join("lists")).context("Failed to open lists DB")?);
        let item_db =
            Arc::new(DB::open(&opts, path.join("items")).context("Failed to open items DB")?);
        let share_db =
            Arc::new(DB::open(&opts, path.join("shares")).context("Failed to open shares DB")?);
        let index_db =
            Arc::new(DB::open(&opts, path.join("index")).context("Failed to open list index DB")?);

        tracing::info!("List store initialized");

        Ok(Self {
            list_db,
            item_db,
            share_db,
            index_db,
            share_lock: Mutex::new(()),
        })
    }

    fn prefix_scan<T: serde::de::DeserializeOwned>(db: &DB, prefix: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let iter = db.iterator(IteratorMode::From(
            prefix.as_bytes(),
            rocksdb::Direction::Forward,
        ));
        for result in iter {
            let (key, value) = result.context("List store iterator error")?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            out.push(serde_json::from_slice(&value).context("Failed to deserialize record")?);
        }
        Ok(out)
    }

    /// Collect the trailing id segment of index keys under `prefix`.
    fn index_ids(&self, prefix: &str) -> Result<Vec<ListId>> {
        let mut ids = Vec::new();
        let iter = self.index_db.iterator(IteratorMode::From(
            prefix.as_bytes(),
            rocksdb::Direction::Forward,
        ));
        for result in iter {
            let (key, _) = result.context("List index iterator error")?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let key_str = std::str::from_utf8(&key).context("Corrupt index key")?;
            let id_str = &key_str[prefix.len()..];
            ids.push(id_str.parse().context("Corrupt index key")?);
        }
        Ok(ids)
    }

    // =========================================================================
    // LISTS
    // =========================================================================

    pub fn create_list(&self, list: &ShoppingList) -> Result<()> {
        let value = serde_json::to_vec(list).context("Failed to serialize list")?;
        let mut batch = WriteBatch::default();
        batch.put(list.id.to_string().as_bytes(), &value);
        self.list_db
            .write(batch)
            .context("Failed to store list")?;
        self.index_db
            .put(
                format!("owner:{}:{}", list.owner_id, list.id).as_bytes(),
                b"1",
            )
            .context("Failed to index list")?;

        tracing::debug!(list_id = %list.id, owner_id = %list.owner_id, "Created list");
        Ok(())
    }

    pub fn get_list(&self, list_id: &ListId) -> Result<Option<ShoppingList>> {
        match self.list_db.get(list_id.to_string().as_bytes())? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("Failed to deserialize list")?,
            )),
            None => Ok(None),
        }
    }

    pub fn update_list(&self, list: &ShoppingList) -> Result<()> {
        let value = serde_json::to_vec(list).context("Failed to serialize list")?;
        self.list_db
            .put(list.id.to_string().as_bytes(), &value)
            .context("Failed to update list")?;
        Ok(())
    }

    /// Delete a list together with its items, shares, and index entries.
    pub fn delete_list(&self, list: &ShoppingList) -> Result<()> {
        let list_prefix = format!("{}:", list.id);

        let mut item_batch = WriteBatch::default();
        let iter = self.item_db.iterator(IteratorMode::From(
            list_prefix.as_bytes(),
            rocksdb::Direction::Forward,
        ));
        for result in iter {
            let (key, _) = result.context("Item iterator error")?;
            if !key.starts_with(list_prefix.as_bytes()) {
                break;
            }
            item_batch.delete(&key);
        }
        self.item_db
            .write(item_batch)
            .context("Failed to delete list items")?;

        let shares = self.shares_for_list(&list.id)?;
        let mut share_batch = WriteBatch::default();
        let mut index_batch = WriteBatch::default();
        for share in &shares {
            share_batch.delete(format!("{}:{}", share.list_id, share.user_id).as_bytes());
            index_batch.delete(format!("member:{}:{}", share.user_id, share.list_id).as_bytes());
        }
        index_batch.delete(format!("owner:{}:{}", list.owner_id, list.id).as_bytes());
        self.share_db
            .write(share_batch)
            .context("Failed to delete list shares")?;
        self.index_db
            .write(index_batch)
            .context("Failed to delete list indexes")?;

        self.list_db
            .delete(list.id.to_string().as_bytes())
            .context("Failed to delete list")?;

        tracing::debug!(list_id = %list.id, "Deleted list");
        Ok(())
    }

    /// Lists owned by a user, most recently updated first.
    pub fn lists_for_owner(&self, user_id: &UserId) -> Result<Vec<ShoppingList>> {
        let ids = self.index_ids(&format!("owner:{}:", user_id))?;
        let mut lists = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(list) = self.get_list(&id)? {
                lists.push(list);
            }
        }
        lists.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(lists)
    }

    /// Lists shared with a user, most recently shared first.
    pub fn lists_shared_with(&self, user_id: &UserId) -> Result<Vec<(ShoppingList, ListShare)>> {
        let ids = self.index_ids(&format!("member:{}:", user_id))?;
        let mut lists = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(share) = self.get_share(&id, user_id)? else {
                continue;
            };
            if let Some(list) = self.get_list(&id)? {
                lists.push((list, share));
            }
        }
        lists.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));
        Ok(lists)
    }

    /// Resolve what `user_id` may do with `list_id`, if anything.
    pub fn access_for(&self, list_id: &ListId, user_id: &UserId) -> Result<Option<ListAccess>> {
        let Some(list) = self.get_list(list_id)? else {
            return Ok(None);
        };
        if list.owner_id == *user_id {
            return Ok(Some(ListAccess::Owner));
        }
        match self.get_share(list_id, user_id)? {
            Some(share) if share.can_edit => Ok(Some(ListAccess::Editor)),
            Some(_) => Ok(Some(ListAccess::Viewer)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // ITEMS
    // =========================================================================

    pub fn create_item(&self, item: &ShoppingListItem) -> Result<()> {
        let key = format!("{}:{}", item.list_id, item.id);
        let value = serde_json::to_vec(item).context("Failed to serialize item")?;
        self.item_db
            .put(key.as_bytes(), &value)
            .context("Failed to store item")?;

        tracing::debug!(item_id = %item.id, list_id = %item.list_id, "Created item");
        Ok(())
    }

    pub fn get_item(&self, list_id: &ListId, item_id: &ItemId) -> Result<Option<ShoppingListItem>> {
        let key = format!("{}:{}", list_id, item_id);
        match self.item_db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("Failed to deserialize item")?,
            )),
            None => Ok(None),
        }
    }

    pub fn update_item(&self, item: &ShoppingListItem) -> Result<()> {
        self.create_item(item)
    }

    pub fn delete_item(&self, list_id: &ListId, item_id: &ItemId) -> Result<bool> {
        let key = format!("{}:{}", list_id, item_id);
        if self.item_db.get(key.as_bytes())?.is_none() {
            return Ok(false);
        }
        self.item_db
            .delete(key.as_bytes())
            .context("Failed to delete item")?;
        Ok(true)
    }

    /// Items on a list, oldest first (insertion order on the page).
    pub fn items_for_list(&self, list_id: &ListId) -> Result<Vec<ShoppingListItem>> {
        let mut items: Vec<ShoppingListItem> =
            Self::prefix_scan(&self.item_db, &format!("{}:", list_id))?;
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    // =========================================================================
    // SHARES
    // =========================================================================

    /// Record a share. Returns `false` when the list is already shared with
    /// that user.
    pub fn add_share(&self, share: &ListShare) -> Result<bool> {
        let key = format!("{}:{}", share.list_id, share.user_id);

        let _guard = self.share_lock.lock();

        if self.share_db.get(key.as_bytes())?.is_some() {
            return Ok(false);
        }

        let value = serde_json::to_vec(share).context("Failed to serialize share")?;
        self.share_db
            .put(key.as_bytes(), &value)
            .context("Failed to store share")?;
        self.index_db
            .put(
                format!("member:{}:{}", share.user_id, share.list_id).as_bytes(),
                b"1",
            )
            .context("Failed to index share")?;

        tracing::debug!(list_id = %share.list_id, user_id = %share.user_id, "Shared list");
        Ok(true)
    }

    pub fn get_share(&self, list_id: &ListId, user_id: &UserId) -> Result<Option<ListShare>> {
        let key = format!("{}:{}", list_id, user_id);
        match self.share_db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("Failed to deserialize share")?,
            )),
            None => Ok(None),
        }
    }

    pub fn shares_for_list(&self, list_id: &ListId) -> Result<Vec<ListShare>> {
        Self::prefix_scan(&self.share_db, &format!("{}:", list_id))
    }

    pub fn flush(&self) -> Result<()> {
        self.list_db.flush().context("Failed to flush list DB")?;
        self.item_db.flush().context("Failed to flush item DB")?;
        self.share_db.flush().context("Failed to flush share DB")?;
        self.index_db.flush().context("Failed to flush list index DB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn store() -> (ListStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (ListStore::new(dir.path()).unwrap(), dir)
    }

    fn list(owner: UserId, name: &str) -> ShoppingList {
        let now = Utc::now();
        ShoppingList {
            id: ListId::new(),
            name: name.to_string(),
            description: None,
            store: None,
            owner_id: owner,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(list_id: ListId, name: &str) -> ShoppingListItem {
        ShoppingListItem {
            id: ItemId::new(),
            list_id,
            name: name.to_string(),
            quantity: None,
            characteristics: None,
            completed: false,
            completed_at: None,
            completed_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_list_roundtrip_and_owner_index() {
        let (store, _dir) = store();
        let owner = UserId::new();
        let l = list(owner, "Spesa");

        store.create_list(&l).unwrap();
        assert_eq!(store.get_list(&l.id).unwrap().unwrap().name, "Spesa");

        let owned = store.lists_for_owner(&owner).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, l.id);
    }

    #[test]
    fn test_access_levels() {
        let (store, _dir) = store();
        let owner = UserId::new();
        let editor = UserId::new();
        let viewer = UserId::new();
        let stranger = UserId::new();
        let l = list(owner, "Spesa");
        store.create_list(&l).unwrap();

        store
            .add_share(&ListShare {
                list_id: l.id,
                user_id: editor,
                can_edit: true,
                created_at: Utc::now(),
            })
            .unwrap();
        store
            .add_share(&ListShare {
                list_id: l.id,
                user_id: viewer,
                can_edit: false,
                created_at: Utc::now(),
            })
            .unwrap();

        assert_eq!(store.access_for(&l.id, &owner).unwrap(), Some(ListAccess::Owner));
        assert_eq!(store.access_for(&l.id, &editor).unwrap(), Some(ListAccess::Editor));
        assert_eq!(store.access_for(&l.id, &viewer).unwrap(), Some(ListAccess::Viewer));
        assert_eq!(store.access_for(&l.id, &stranger).unwrap(), None);

        assert!(store.access_for(&l.id, &owner).unwrap().unwrap().can_edit());
        assert!(!store.access_for(&l.id, &viewer).unwrap().unwrap().can_edit());
    }

    #[test]
    fn test_duplicate_share_rejected() {
        let (store, _dir) = store();
        let owner = UserId::new();
        let other = UserId::new();
        let l = list(owner, "Spesa");
        store.create_list(&l).unwrap();

        let share = ListShare {
            list_id: l.id,
            user_id: other,
            can_edit: true,
            created_at: Utc::now(),
        };
        assert!(store.add_share(&share).unwrap());
        assert!(!store.add_share(&share).unwrap());
    }

    #[test]
    fn test_items_ordered_by_creation() {
        let (store, _dir) = store();
        let l = list(UserId::new(), "Spesa");
        store.create_list(&l).unwrap();

        let first = item(l.id, "pane");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = item(l.id, "latte");
        store.create_item(&second).unwrap();
        store.create_item(&first).unwrap();

        let items = store.items_for_list(&l.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "pane");
        assert_eq!(items[1].name, "latte");
    }

    #[test]
    fn test_delete_list_cascades() {
        let (store, _dir) = store();
        let owner = UserId::new();
        let member = UserId::new();
        let l = list(owner, "Spesa");
        store.create_list(&l).unwrap();
        store.create_item(&item(l.id, "pane")).unwrap();
        store
            .add_share(&ListShare {
                list_id: l.id,
                user_id: member,
                can_edit: true,
                created_at: Utc::now(),
            })
            .unwrap();

        store.delete_list(&l).unwrap();

        assert!(store.get_list(&l.id).unwrap().is_none());
        assert!(store.items_for_list(&l.id).unwrap().is_empty());
        assert!(store.shares_for_list(&l.id).unwrap().is_empty());
        assert!(store.lists_for_owner(&owner).unwrap().is_empty());
        assert!(store.lists_shared_with(&member).unwrap().is_empty());
    }
}
