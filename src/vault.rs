//! Vault Module
//!
//! Ties the collection to the session: every session change reloads or
//! clears the collection.

use tracing::{info, warn};

use crate::auth::{AuthStore, PasswordHasher};
use crate::collection::CollectionStore;
use crate::error::{Result, VaultError};
use crate::storage::SharedStore;

/// Auth store and collection store over one substrate.
pub struct Vault {
    auth: AuthStore,
    collection: CollectionStore,
}

impl Vault {
    /// Opens the vault and resumes the previous session, if any.
    pub fn open(store: SharedStore, hasher: PasswordHasher) -> Result<Self> {
        let mut vault = Self {
            auth: AuthStore::new(store.clone(), hasher),
            collection: CollectionStore::new(store),
        };
        if let Some(username) = vault.auth.resume_session()? {
            vault.collection.load(&username)?;
        }
        Ok(vault)
    }

    pub fn current_user(&self) -> Option<&str> {
        self.auth.current_user()
    }

    /// Switches the session to `username`.
    ///
    /// The collection is loaded before the session pointer moves; if it
    /// cannot be loaded the previous session and its collection stay as
    /// they were.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.auth.authenticate(username, password)?;
        self.switch_to(username)
    }

    /// Adds a credential and switches the session to it, as `login` does.
    pub fn register(&mut self, username: &str, password: &str) -> Result<()> {
        self.auth.add_credential(username, password)?;
        self.switch_to(username)
    }

    fn switch_to(&mut self, username: &str) -> Result<()> {
        self.collection.load(username)?;
        if let Err(err) = self.auth.start_session(username) {
            warn!("Session pointer not updated for '{}': {}", username, err);
            self.collection.clear();
            return Err(err);
        }
        Ok(())
    }

    /// User whose session and collection are both loaded.
    ///
    /// `NotAuthenticated` when either is missing or they disagree.
    pub fn session_owner(&self) -> Result<&str> {
        match (self.auth.current_user(), self.collection.owner()) {
            (Some(user), Some(owner)) if user == owner => Ok(user),
            _ => Err(VaultError::NotAuthenticated),
        }
    }

    pub fn logout(&mut self) -> Result<()> {
        self.auth.logout()?;
        self.collection.clear();
        info!("Collection cleared after logout");
        Ok(())
    }

    pub fn collection(&self) -> &CollectionStore {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut CollectionStore {
        &mut self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CatalogItem, ItemSnapshot};
    use crate::storage::{collection_key, KeyValueStore, MemoryStore, SESSION_POINTER_KEY};
    use std::sync::Arc;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn test_collection_follows_session() {
        let store = Arc::new(MemoryStore::new());
        let mut vault = Vault::open(store.clone(), hasher()).unwrap();
        assert_eq!(vault.current_user(), None);

        vault.register("ash", "pikachu").unwrap();
        vault
            .collection_mut()
            .add(CatalogItem::new("x", ItemSnapshot::named("Pikachu")))
            .unwrap();

        vault.register("misty", "starmie").unwrap();
        assert!(!vault.collection().is_owned("x"));

        vault.logout().unwrap();
        assert_eq!(vault.collection().owner(), None);
        assert!(vault.collection().items().is_empty());

        vault.login("ash", "pikachu").unwrap();
        assert_eq!(vault.collection().quantity_of("x"), 1);
    }

    #[test]
    fn test_reopen_resumes_session_and_collection() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut vault = Vault::open(store.clone(), hasher()).unwrap();
            vault.register("ash", "pikachu").unwrap();
            vault
                .collection_mut()
                .add(CatalogItem::new("x", ItemSnapshot::named("Pikachu")))
                .unwrap();
        }

        let vault = Vault::open(store, hasher()).unwrap();
        assert_eq!(vault.current_user(), Some("ash"));
        assert_eq!(vault.collection().quantity_of("x"), 1);
    }

    #[test]
    fn test_failed_login_keeps_current_collection() {
        let store = Arc::new(MemoryStore::new());
        let mut vault = Vault::open(store, hasher()).unwrap();
        vault.register("ash", "pikachu").unwrap();
        vault
            .collection_mut()
            .add(CatalogItem::new("x", ItemSnapshot::named("Pikachu")))
            .unwrap();

        assert!(vault.login("ash", "wrong").is_err());
        assert_eq!(vault.current_user(), Some("ash"));
        assert!(vault.collection().is_owned("x"));
    }

    #[test]
    fn test_unloadable_collection_does_not_switch_session() {
        let store = Arc::new(MemoryStore::new());
        let mut vault = Vault::open(store.clone(), hasher()).unwrap();
        vault.register("ash", "pikachu").unwrap();
        vault.logout().unwrap();
        store.set(&collection_key("ash"), "not json").unwrap();

        let result = vault.login("ash", "pikachu");
        assert!(matches!(result, Err(VaultError::StorageMalformed { .. })));
        assert_eq!(vault.current_user(), None);
        assert_eq!(store.get(SESSION_POINTER_KEY).unwrap(), None);
        assert!(matches!(
            vault.session_owner(),
            Err(VaultError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_unloadable_collection_keeps_previous_session() {
        let store = Arc::new(MemoryStore::new());
        let mut vault = Vault::open(store.clone(), hasher()).unwrap();
        vault.register("ash", "pikachu").unwrap();
        vault.register("misty", "starmie").unwrap();
        vault
            .collection_mut()
            .add(CatalogItem::new("s", ItemSnapshot::named("Starmie")))
            .unwrap();
        store.set(&collection_key("ash"), "not json").unwrap();

        assert!(vault.login("ash", "pikachu").is_err());
        assert_eq!(vault.session_owner().unwrap(), "misty");
        assert_eq!(
            store.get(SESSION_POINTER_KEY).unwrap().as_deref(),
            Some("misty")
        );
        let quantity = vault
            .collection_mut()
            .add(CatalogItem::new("s", ItemSnapshot::named("Starmie")))
            .unwrap();
        assert_eq!(quantity, 2);
    }
}
