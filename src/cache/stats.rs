//! Cache Statistics Module
//!
//! Counters for lookups and removals, plus the live entry count at the
//! moment a snapshot was taken.

use serde::Serialize;

// == Cache Event ==
/// Something worth counting that happened inside the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    /// A lookup found a live entry
    Hit,
    /// A lookup found nothing, or only an expired entry
    Miss,
    /// A live entry was dropped to make room under the size budget
    Eviction,
    /// An entry was purged after its expiry time passed
    Expiration,
}

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Live entries when the snapshot was taken; zero inside the cache
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the counter matching `event`.
    pub fn record(&mut self, event: CacheEvent) {
        let counter = match event {
            CacheEvent::Hit => &mut self.hits,
            CacheEvent::Miss => &mut self.misses,
            CacheEvent::Eviction => &mut self.evictions,
            CacheEvent::Expiration => &mut self.expirations,
        };
        *counter = counter.saturating_add(1);
    }

    /// Total number of lookups, hits and misses together.
    pub fn lookups(&self) -> u64 {
        self.hits.saturating_add(self.misses)
    }

    /// hits / lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    /// Entries that left the cache without an explicit delete or pop.
    pub fn removals(&self) -> u64 {
        self.evictions.saturating_add(self.expirations)
    }

    /// Returns a copy of these counters stamped with the live entry count.
    pub fn snapshot(&self, total_entries: usize) -> Self {
        Self {
            total_entries,
            ..self.clone()
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.lookups(), 0);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record(CacheEvent::Hit);
        stats.record(CacheEvent::Hit);
        stats.record(CacheEvent::Hit);
        stats.record(CacheEvent::Miss);
        assert_eq!(stats.lookups(), 4);
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_hit_rate_all_misses() {
        let mut stats = CacheStats::new();
        stats.record(CacheEvent::Miss);
        stats.record(CacheEvent::Miss);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_removals_count_evictions_and_expirations() {
        let mut stats = CacheStats::new();
        stats.record(CacheEvent::Eviction);
        stats.record(CacheEvent::Expiration);
        stats.record(CacheEvent::Expiration);

        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expirations, 2);
        assert_eq!(stats.removals(), 3);
        assert_eq!(stats.lookups(), 0);
    }

    #[test]
    fn test_snapshot_keeps_counters() {
        let mut stats = CacheStats::new();
        stats.record(CacheEvent::Hit);

        let snapshot = stats.snapshot(42);
        assert_eq!(snapshot.total_entries, 42);
        assert_eq!(snapshot.hits, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_serializes_all_counters() {
        let mut stats = CacheStats::new();
        stats.record(CacheEvent::Miss);
        let json = serde_json::to_value(stats.snapshot(3)).unwrap();

        assert_eq!(json["misses"], 1);
        assert_eq!(json["expirations"], 0);
        assert_eq!(json["total_entries"], 3);
    }
}
