//! Expiry Index Module
//!
//! Keeps each key's absolute expiry time in insertion order. Every write
//! appends `now + ttl` with a fixed ttl, so insertion order is also expiry
//! order and the expired entries always form a prefix.

use std::hash::Hash;
use std::time::Duration;

use hashlink::LinkedHashMap;

/// Iterator over `(key, expiry)` pairs, soonest expiry first.
pub type Iter<'a, K> = hashlink::linked_hash_map::Iter<'a, K, Duration>;

// == Expiry Index ==
/// Key to expiry timestamp map ordered by expiry.
///
/// - Front = expires soonest
/// - Back = expires last
#[derive(Debug)]
pub struct ExpiryIndex<K: Hash + Eq> {
    entries: LinkedHashMap<K, Duration>,
}

impl<K: Hash + Eq> ExpiryIndex<K> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: LinkedHashMap::new(),
        }
    }

    // == Record ==
    /// Records `expires_at` for `key` at the back of the index.
    ///
    /// An existing entry is dropped first so a renewed key sorts after
    /// every entry written before it.
    pub fn record(&mut self, key: K, expires_at: Duration) {
        self.entries.remove(&key);
        self.entries.insert(key, expires_at);
    }

    // == Lookup ==
    pub fn get(&self, key: &K) -> Option<Duration> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    // == Remove ==
    pub fn remove(&mut self, key: &K) -> Option<Duration> {
        self.entries.remove(key)
    }

    // == Pop Expired ==
    /// Removes and returns the front key if it expired before `now`.
    ///
    /// An entry whose expiry equals `now` is still alive.
    pub fn pop_expired(&mut self, now: Duration) -> Option<(K, Duration)> {
        let expired = matches!(self.entries.front(), Some((_, expires_at)) if *expires_at < now);
        if expired {
            self.entries.pop_front()
        } else {
            None
        }
    }

    // == Expired Prefix ==
    /// Counts the entries expired before `now` without removing them.
    pub fn expired_count(&self, now: Duration) -> usize {
        self.entries
            .iter()
            .take_while(|(_, expires_at)| **expires_at < now)
            .count()
    }

    // == Front ==
    /// Returns the entry that expires soonest.
    pub fn front(&self) -> Option<(&K, Duration)> {
        self.entries.front().map(|(key, expires_at)| (key, *expires_at))
    }

    /// Iterates entries in expiry order.
    pub fn iter(&self) -> Iter<'_, K> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Hash + Eq> Default for ExpiryIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
