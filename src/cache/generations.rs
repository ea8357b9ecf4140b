//! Generation Table Module
//!
//! Named, independently deletable namespaces of cached responses. Only the
//! generation the active manager serves is meant to survive activation.

use std::collections::HashMap;

use crate::cache::{CacheStats, RequestKey, ResponseSnapshot};

// == Generation ==
/// One namespace of cached responses.
#[derive(Debug, Default)]
pub struct Generation {
    entries: HashMap<RequestKey, ResponseSnapshot>,
}

impl Generation {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Generation Table ==
/// All generations plus interception statistics.
#[derive(Debug, Default)]
pub struct GenerationTable {
    generations: HashMap<String, Generation>,
    stats: CacheStats,
}

impl GenerationTable {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Open ==
    /// Creates `name` if it does not exist yet.
    pub fn open(&mut self, name: &str) -> &mut Generation {
        self.generations.entry(name.to_string()).or_default()
    }

    /// Names of every stored generation, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.generations.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.generations.contains_key(name)
    }

    // == Delete ==
    /// Drops a whole generation. Returns false if it did not exist.
    pub fn delete(&mut self, name: &str) -> bool {
        self.generations.remove(name).is_some()
    }

    // == Retain Only ==
    /// Deletes every generation except `current`, returning the deleted names.
    pub fn retain_only(&mut self, current: &str) -> Vec<String> {
        let stale: Vec<String> = self
            .generations
            .keys()
            .filter(|name| name.as_str() != current)
            .cloned()
            .collect();

        for name in &stale {
            self.generations.remove(name);
        }
        stale
    }

    // == Lookup ==
    /// Finds `key` in generation `name`, recording a hit or a miss.
    pub fn lookup(&mut self, name: &str, key: &RequestKey) -> Option<ResponseSnapshot> {
        let found = self
            .generations
            .get(name)
            .and_then(|generation| generation.entries.get(key))
            .cloned();

        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    /// Finds `key` without touching statistics.
    pub fn peek(&self, name: &str, key: &RequestKey) -> Option<&ResponseSnapshot> {
        self.generations
            .get(name)
            .and_then(|generation| generation.entries.get(key))
    }

    // == Put ==
    /// Stores `response` under `key` in `name`, but only while `name` is
    /// still live; a deleted generation is never brought back by a write.
    pub fn put_if_live(&mut self, name: &str, key: RequestKey, response: ResponseSnapshot) -> bool {
        match self.generations.get_mut(name) {
            Some(generation) => {
                generation.entries.insert(key, response);
                true
            }
            None => false,
        }
    }

    // == Stats ==
    /// Statistics with the entry count of generation `name`.
    pub fn stats(&self, name: &str) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.generations.get(name).map_or(0, Generation::len));
        stats
    }

    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }
}
