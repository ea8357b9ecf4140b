//! Collection Module
//!
//! Per-user ordered inventory of owned items, persisted after every change.

mod item;
mod record;


pub use item::{by_display_name, CatalogItem, CollectionItem, ItemSnapshot};
pub use record::CURRENT_SCHEMA_VERSION;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{Result, VaultError};
use crate::storage::{collection_key, SharedStore};

// == Collection Store ==
/// In-memory collection of the active session plus its durable record.
///
/// Without an owner the collection is empty and every mutation is ignored.
pub struct CollectionStore {
    store: SharedStore,
    owner: Option<String>,
    items: Vec<CollectionItem>,
}

impl CollectionStore {
    /// Creates an ownerless, empty store.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            owner: None,
            items: Vec::new(),
        }
    }

    /// User whose collection is loaded.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Items in display order.
    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    // == Load ==
    /// Replaces in-memory state with `username`'s durable record.
    ///
    /// Records stored in an older shape are migrated and written back before
    /// this returns. On error the previously loaded collection is kept.
    pub fn load(&mut self, username: &str) -> Result<()> {
        let key = collection_key(username);
        let items = match self.store.get(&key)? {
            Some(raw) => {
                let decoded = record::decode(&key, &raw)?;
                if decoded.needs_rewrite() {
                    info!(
                        "Migrating '{}' from schema v{} to v{}",
                        key, decoded.stored_version, CURRENT_SCHEMA_VERSION
                    );
                    self.store.set(&key, &record::encode(&decoded.items)?)?;
                }
                decoded.items
            }
            None => Vec::new(),
        };

        debug!("Loaded {} collection items for '{}'", items.len(), username);
        self.owner = Some(username.to_string());
        self.items = items;
        Ok(())
    }

    // == Clear ==
    /// Drops the in-memory collection without touching storage.
    pub fn clear(&mut self) {
        self.owner = None;
        self.items.clear();
    }

    // == Add ==
    /// Adds one copy of `item`, returning the new quantity.
    ///
    /// A new item is stamped with the current time and the collection is
    /// re-sorted by display name.
    pub fn add(&mut self, item: CatalogItem) -> Result<u32> {
        if self.owner.is_none() {
            debug!("Ignoring add of '{}' without a session", item.id);
            return Ok(0);
        }

        let quantity = match self.position(&item.id) {
            Some(index) => {
                let existing = &mut self.items[index];
                existing.quantity = existing.quantity.checked_add(1).ok_or_else(|| {
                    VaultError::InvalidRequest(format!(
                        "quantity limit reached for '{}'",
                        existing.item_id
                    ))
                })?;
                existing.quantity
            }
            None => {
                self.items.push(CollectionItem::first_copy(item, Utc::now()));
                self.items.sort_by(by_display_name);
                1
            }
        };

        self.persist()?;
        Ok(quantity)
    }

    // == Decrease ==
    /// Removes one copy of `item_id`, returning the remaining quantity.
    ///
    /// The last copy removes the entry. Unknown ids are a no-op.
    pub fn decrease(&mut self, item_id: &str) -> Result<u32> {
        let Some(index) = self.position(item_id) else {
            return Ok(0);
        };

        let remaining = if self.items[index].quantity > 1 {
            self.items[index].quantity -= 1;
            self.items[index].quantity
        } else {
            self.items.remove(index);
            0
        };

        self.persist()?;
        Ok(remaining)
    }

    // == Remove All ==
    /// Removes `item_id` whatever its quantity. Returns whether it was owned.
    pub fn remove_all(&mut self, item_id: &str) -> Result<bool> {
        let Some(index) = self.position(item_id) else {
            return Ok(false);
        };

        self.items.remove(index);
        self.persist()?;
        Ok(true)
    }

    // == Queries ==
    /// True if at least one copy of `item_id` is owned.
    pub fn is_owned(&self, item_id: &str) -> bool {
        self.position(item_id).is_some()
    }

    /// Copies of `item_id` owned, zero if none.
    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.position(item_id)
            .map(|index| self.items[index].quantity)
            .unwrap_or(0)
    }

    /// Copies across all items.
    pub fn total_copies(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Market value of the whole collection.
    pub fn market_value(&self) -> f64 {
        self.items.iter().map(CollectionItem::value).sum()
    }

    fn position(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.item_id == item_id)
    }

    /// Writes the current items; an empty collection has no record.
    fn persist(&self) -> Result<()> {
        let Some(owner) = &self.owner else {
            return Ok(());
        };
        let key = collection_key(owner);
        if self.items.is_empty() {
            self.store.delete(&key)
        } else {
            self.store.set(&key, &record::encode(&self.items)?)
        }
    }
}
