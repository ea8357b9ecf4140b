//! Auth Module
//!
//! Local credential table plus the durable session pointer.

mod password;

pub use password::PasswordHasher;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, VaultError};
use crate::storage::{SharedStore, SESSION_POINTER_KEY, USER_TABLE_KEY};

// == Credential ==
/// One row of the credential table.
///
/// New rows only carry `passwordHash`. Rows written by older builds carry a
/// plaintext `password`; they are upgraded on the first successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    #[serde(rename = "passwordHash", default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// == Auth Store ==
/// Manages the credential table and the session pointer.
pub struct AuthStore {
    store: SharedStore,
    hasher: PasswordHasher,
    current: Option<String>,
}

impl AuthStore {
    /// Creates a logged-out store over `store`.
    ///
    /// Call [`AuthStore::resume_session`] to pick up a previous session.
    pub fn new(store: SharedStore, hasher: PasswordHasher) -> Self {
        Self {
            store,
            hasher,
            current: None,
        }
    }

    /// The currently authenticated username, if any.
    pub fn current_user(&self) -> Option<&str> {
        self.current.as_deref()
    }

    // == Resume Session ==
    /// Trusts the durable session pointer without asking for the password.
    ///
    /// The pointer lives next to the credential table on local storage, so
    /// anyone able to forge it could also rewrite the table. Returns the
    /// resumed username.
    pub fn resume_session(&mut self) -> Result<Option<String>> {
        let pointer = self.store.get(SESSION_POINTER_KEY)?;
        match &pointer {
            Some(username) => info!("Resuming session for '{}'", username),
            None => debug!("No session to resume"),
        }
        self.current = pointer.clone();
        Ok(pointer)
    }

    // == Login ==
    /// Authenticates `username` and points the session at it.
    ///
    /// Any mismatch yields `InvalidCredentials` and leaves the session
    /// pointer untouched.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.authenticate(username, password)?;
        self.start_session(username)
    }

    /// Checks `password` against the stored credential without touching the
    /// session. A legacy plaintext row is upgraded on success.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        let mut table = self.load_table()?;
        let Some(index) = table.iter().position(|c| c.username == username) else {
            debug!("Login rejected: unknown user");
            return Err(VaultError::InvalidCredentials);
        };

        let credential = &mut table[index];
        match (credential.password_hash.clone(), credential.password.clone()) {
            (Some(hash), _) => {
                if !self.hasher.verify(password, &hash) {
                    debug!("Login rejected for '{}'", username);
                    return Err(VaultError::InvalidCredentials);
                }
            }
            (None, Some(plain)) => {
                if plain != password {
                    debug!("Login rejected for '{}'", username);
                    return Err(VaultError::InvalidCredentials);
                }
                info!("Upgrading plaintext credential for '{}'", username);
                credential.password_hash = Some(self.hasher.hash(password)?);
                credential.password = None;
                self.save_table(&table)?;
            }
            (None, None) => {
                warn!("Credential for '{}' has no secret", username);
                return Err(VaultError::InvalidCredentials);
            }
        }
        Ok(())
    }

    // == Register ==
    /// Adds a credential and logs the new user in.
    pub fn register(&mut self, username: &str, password: &str) -> Result<()> {
        self.add_credential(username, password)?;
        self.start_session(username)
    }

    /// Appends a credential for `username` without touching the session.
    pub fn add_credential(&self, username: &str, password: &str) -> Result<()> {
        if username.is_empty() {
            return Err(VaultError::InvalidRequest(
                "Username cannot be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(VaultError::InvalidRequest(
                "Password cannot be empty".to_string(),
            ));
        }

        let mut table = self.load_table()?;
        if table.iter().any(|c| c.username == username) {
            return Err(VaultError::UsernameTaken(username.to_string()));
        }

        table.push(Credential {
            username: username.to_string(),
            password_hash: Some(self.hasher.hash(password)?),
            password: None,
        });
        self.save_table(&table)?;
        info!("Registered user '{}'", username);
        Ok(())
    }

    // == Logout ==
    /// Clears the session pointer. The credential table is not touched.
    pub fn logout(&mut self) -> Result<()> {
        self.store.delete(SESSION_POINTER_KEY)?;
        if let Some(username) = self.current.take() {
            info!("Logged out '{}'", username);
        }
        Ok(())
    }

    /// Points the durable session at an already authenticated `username`.
    pub fn start_session(&mut self, username: &str) -> Result<()> {
        self.store.set(SESSION_POINTER_KEY, username)?;
        self.current = Some(username.to_string());
        info!("Session started for '{}'", username);
        Ok(())
    }

    fn load_table(&self) -> Result<Vec<Credential>> {
        match self.store.get(USER_TABLE_KEY)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| VaultError::malformed(USER_TABLE_KEY, e)),
            None => Ok(Vec::new()),
        }
    }

    fn save_table(&self, table: &[Credential]) -> Result<()> {
        let raw = serde_json::to_string(table)
            .map_err(|e| VaultError::Internal(e.to_string()))?;
        self.store.set(USER_TABLE_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryStore>, AuthStore) {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthStore::new(store.clone(), PasswordHasher::with_params(8, 1, 1).unwrap());
        (store, auth)
    }

    #[test]
    fn test_register_then_login() {
        let (store, mut auth) = setup();

        auth.register("ash", "pikachu").unwrap();
        assert_eq!(auth.current_user(), Some("ash"));

        auth.logout().unwrap();
        assert_eq!(auth.current_user(), None);
        assert_eq!(store.get(SESSION_POINTER_KEY).unwrap(), None);

        auth.login("ash", "pikachu").unwrap();
        assert_eq!(store.get(SESSION_POINTER_KEY).unwrap().as_deref(), Some("ash"));
    }

    #[test]
    fn test_register_duplicate_username() {
        let (_, mut auth) = setup();

        auth.register("ash", "pikachu").unwrap();
        let result = auth.register("ash", "other");
        assert!(matches!(result, Err(VaultError::UsernameTaken(name)) if name == "ash"));

        // first registration's password still works
        auth.logout().unwrap();
        auth.login("ash", "pikachu").unwrap();
    }

    #[test]
    fn test_usernames_are_case_sensitive() {
        let (_, mut auth) = setup();

        auth.register("ash", "pikachu").unwrap();
        auth.register("Ash", "eevee").unwrap();
        assert!(matches!(
            auth.login("ASH", "pikachu"),
            Err(VaultError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_wrong_password_leaves_pointer_unset() {
        let (store, mut auth) = setup();

        auth.register("ash", "pikachu").unwrap();
        auth.logout().unwrap();

        let result = auth.login("ash", "wrong");
        assert!(matches!(result, Err(VaultError::InvalidCredentials)));
        assert_eq!(store.get(SESSION_POINTER_KEY).unwrap(), None);
        assert_eq!(auth.current_user(), None);
    }

    #[test]
    fn test_authenticate_does_not_move_session() {
        let (store, mut auth) = setup();
        auth.register("ash", "pikachu").unwrap();
        auth.register("misty", "starmie").unwrap();

        auth.authenticate("ash", "pikachu").unwrap();
        assert_eq!(auth.current_user(), Some("misty"));
        assert_eq!(store.get(SESSION_POINTER_KEY).unwrap().as_deref(), Some("misty"));
    }

    #[test]
    fn test_unknown_user() {
        let (_, mut auth) = setup();
        assert!(matches!(
            auth.login("gary", "x"),
            Err(VaultError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_is_not_stored_in_clear() {
        let (store, mut auth) = setup();
        auth.register("ash", "pikachu").unwrap();

        let raw = store.get(USER_TABLE_KEY).unwrap().unwrap();
        assert!(!raw.contains("pikachu"));
        assert!(raw.contains("passwordHash"));
    }

    #[test]
    fn test_legacy_plaintext_credential_is_upgraded() {
        let (store, mut auth) = setup();
        store
            .set(USER_TABLE_KEY, r#"[{"username":"misty","password":"starmie"}]"#)
            .unwrap();

        assert!(matches!(
            auth.login("misty", "psyduck"),
            Err(VaultError::InvalidCredentials)
        ));
        auth.login("misty", "starmie").unwrap();

        let table: Vec<Credential> =
            serde_json::from_str(&store.get(USER_TABLE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(table[0].password, None);
        assert!(table[0].password_hash.is_some());

        auth.logout().unwrap();
        auth.login("misty", "starmie").unwrap();
    }

    #[test]
    fn test_resume_session_trusts_pointer() {
        let (store, mut auth) = setup();
        store.set(SESSION_POINTER_KEY, "brock").unwrap();

        let resumed = auth.resume_session().unwrap();
        assert_eq!(resumed.as_deref(), Some("brock"));
        assert_eq!(auth.current_user(), Some("brock"));
    }

    #[test]
    fn test_malformed_table_fails_loud() {
        let (store, mut auth) = setup();
        store.set(USER_TABLE_KEY, "{not json").unwrap();

        let result = auth.login("ash", "pikachu");
        assert!(matches!(
            result,
            Err(VaultError::StorageMalformed { key, .. }) if key == USER_TABLE_KEY
        ));
    }

    #[test]
    fn test_register_rejects_empty_fields() {
        let (_, mut auth) = setup();
        assert!(matches!(
            auth.register("", "x"),
            Err(VaultError::InvalidRequest(_))
        ));
        assert!(matches!(
            auth.register("ash", ""),
            Err(VaultError::InvalidRequest(_))
        ));
    }
}
