//! Storage Module
//!
//! The durable key-value substrate shared by the auth and collection stores.
//! Each store owns its own keys; nothing reaches the substrate except through
//! an injected [`KeyValueStore`].

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use crate::error::Result;

// == Record Keys ==
/// Key of the pointer naming the currently authenticated user.
pub const SESSION_POINTER_KEY: &str = "session-pointer";

/// Key of the credential table.
pub const USER_TABLE_KEY: &str = "user-table";

/// Key of a user's collection record.
pub fn collection_key(username: &str) -> String {
    format!("collection:{}", username)
}

// == Key-Value Store Trait ==
/// Durable, synchronous, string-keyed storage.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Shared handle to a substrate.
pub type SharedStore = Arc<dyn KeyValueStore>;
