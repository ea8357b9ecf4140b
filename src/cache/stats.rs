//! Cache Statistics Module
//!
//! Tracks interception outcomes: hits, misses, refreshes and fallbacks.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Requests answered from the current generation
    pub hits: u64,
    /// Requests that had to wait for the network
    pub misses: u64,
    /// Background refreshes that replaced an entry
    pub refreshes: u64,
    /// Background refreshes that failed or returned a non-200 status
    pub failed_refreshes: u64,
    /// Offline navigations answered with the shell
    pub fallbacks: u64,
    /// Mutating requests passed straight through
    pub passthroughs: u64,
    /// Entries in the current generation
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_refresh(&mut self) {
        self.refreshes += 1;
    }

    pub fn record_failed_refresh(&mut self) {
        self.failed_refreshes += 1;
    }

    pub fn record_fallback(&mut self) {
        self.fallbacks += 1;
    }

    pub fn record_passthrough(&mut self) {
        self.passthroughs += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.refreshes, 0);
        assert_eq!(stats.fallbacks, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_outcome_counters() {
        let mut stats = CacheStats::new();
        stats.record_refresh();
        stats.record_failed_refresh();
        stats.record_failed_refresh();
        stats.record_fallback();
        stats.record_passthrough();
        assert_eq!(stats.refreshes, 1);
        assert_eq!(stats.failed_refreshes, 2);
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.passthroughs, 1);
    }
}
