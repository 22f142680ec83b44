//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::hash::Hash;

use hashlink::linked_hash_map::RawEntryMut;
use hashlink::LinkedHashMap;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys are stored in a linked hash map where:
/// - Front = Least recently used
/// - Back = Most recently used
#[derive(Debug)]
pub struct LruTracker<K: Hash + Eq> {
    /// Order of keys by access time
    order: LinkedHashMap<K, ()>,
}

impl<K: Hash + Eq + Clone> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: LinkedHashMap::new(),
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves to back).
    ///
    /// A key not yet tracked is added at the back.
    pub fn touch(&mut self, key: &K) {
        match self.order.raw_entry_mut().from_key(key) {
            RawEntryMut::Occupied(mut occupied) => occupied.to_back(),
            RawEntryMut::Vacant(vacant) => {
                vacant.insert(key.clone(), ());
            }
        }
    }

    // == Insert ==
    /// Adds a newly stored key as the most recently used.
    pub fn insert(&mut self, key: K) {
        self.order.insert(key, ());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    ///
    /// Callers only remove keys they know are tracked.
    pub fn remove(&mut self, key: &K) {
        let removed = self.order.remove(key);
        debug_assert!(removed.is_some(), "removed a key the LRU tracker never saw");
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.order.front().map(|(key, _)| key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &K) -> bool {
        self.order.contains_key(key)
    }

    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.keys()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

impl<K: Hash + Eq + Clone> Default for LruTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}
