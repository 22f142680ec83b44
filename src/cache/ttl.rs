//! TTL Cache Module
//!
//! Main cache engine: a bounded store plus an expiry index and an LRU
//! tracker, kept in lockstep, all driven by one snapshot timer.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use tracing::debug;

use crate::cache::clock::{Clock, SystemClock, Timer};
use crate::cache::expiry::{self, ExpiryIndex};
use crate::cache::state::{CacheState, StateEntry};
use crate::cache::store::{BoundedStore, Evictor, Sizer, UnitSize};
use crate::cache::stats::{CacheEvent, CacheStats};
use crate::cache::LruTracker;
use crate::error::{CacheError, Result};

// == Entries ==
/// The three structures describing stored entries.
///
/// Everything here takes `now` from the caller; only [`TtlCache`] owns the
/// timer.
#[derive(Debug)]
struct Entries<K: Hash + Eq, V, S> {
    store: BoundedStore<K, V, S>,
    expiry: ExpiryIndex<K>,
    lru: LruTracker<K>,
    stats: CacheStats,
}

/// Evicts through the LRU tracker and keeps the indices in step with the
/// store.
struct LruEvictor<'a, K: Hash + Eq> {
    expiry: &'a mut ExpiryIndex<K>,
    lru: &'a mut LruTracker<K>,
    stats: &'a mut CacheStats,
}

impl<K, V> Evictor<K, V> for LruEvictor<'_, K>
where
    K: Hash + Eq + Clone + Debug,
{
    fn select_victim(&mut self) -> Option<K> {
        self.lru.peek_oldest().cloned()
    }

    fn evicted(&mut self, key: &K, _value: V) {
        self.lru.remove(key);
        self.expiry.remove(key);
        self.stats.record(CacheEvent::Eviction);
        debug!("Evicted least recently used key {:?}", key);
    }
}

impl<K, V, S> Entries<K, V, S>
where
    K: Hash + Eq + Clone + Debug,
    S: Sizer<V>,
{
    fn new(maxsize: usize, sizer: S) -> Self {
        Self {
            store: BoundedStore::new(maxsize, sizer),
            expiry: ExpiryIndex::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
        }
    }

    // == Purge ==
    /// Removes every entry that expired before `now`.
    ///
    /// Only the expired prefix of the expiry index is visited.
    fn purge(&mut self, now: Duration) -> Vec<(K, V)> {
        let mut purged = Vec::new();
        while let Some((key, _)) = self.expiry.pop_expired(now) {
            self.lru.remove(&key);
            if let Some(value) = self.store.remove(&key) {
                self.stats.record(CacheEvent::Expiration);
                purged.push((key, value));
            }
        }
        if !purged.is_empty() {
            debug!("Purged {} expired entries", purged.len());
        }
        purged
    }

    // == Remove ==
    /// Drops `key` from all three structures.
    ///
    /// Returns the value and the expiry it had, if it was stored.
    fn remove(&mut self, key: &K) -> Option<(V, Option<Duration>)> {
        let value = self.store.remove(key)?;
        self.lru.remove(key);
        let expires_at = self.expiry.remove(key);
        Some((value, expires_at))
    }

    fn get(&mut self, key: &K, now: Duration) -> Result<&V> {
        let expired = self
            .expiry
            .get(key)
            .is_some_and(|expires_at| expires_at < now);
        if expired || !self.store.contains_key(key) {
            self.stats.record(CacheEvent::Miss);
            return Err(CacheError::not_found(key));
        }

        self.lru.touch(key);
        self.stats.record(CacheEvent::Hit);
        self.store
            .get(key)
            .ok_or_else(|| CacheError::not_found(key))
    }

    fn set(&mut self, key: K, value: V, now: Duration, ttl: Duration) -> Result<()> {
        self.purge(now);

        let mut evictor = LruEvictor {
            expiry: &mut self.expiry,
            lru: &mut self.lru,
            stats: &mut self.stats,
        };
        self.store.insert(key.clone(), value, &mut evictor)?;

        // An overwrite keeps its LRU position; only new keys join at the back.
        if !self.expiry.contains(&key) {
            self.lru.insert(key.clone());
        }
        self.expiry.record(key, now.saturating_add(ttl));
        Ok(())
    }

    fn delete(&mut self, key: &K, now: Duration) -> Result<V> {
        let (value, expires_at) = self
            .remove(key)
            .ok_or_else(|| CacheError::not_found(key))?;
        match expires_at {
            Some(expires_at) if expires_at < now => Err(CacheError::not_found(key)),
            _ => Ok(value),
        }
    }

    fn live_len(&self, now: Duration) -> usize {
        self.expiry.len() - self.expiry.expired_count(now)
    }

    fn clear(&mut self) {
        self.store.clear();
        self.expiry.clear();
        self.lru.clear();
    }
}

// == TTL Cache ==
/// Bounded cache with LRU eviction and a fixed time-to-live per entry.
///
/// Expired entries are invisible immediately but only physically removed by
/// the next purge (any write, [`TtlCache::expire`], size queries, `clear`,
/// `pop_lru`). Every operation reads the clock once through a snapshot
/// scope, so a compound operation sees a single "now".
///
/// `maxsize` is measured with the sizer `S`; with the default [`UnitSize`]
/// it is an entry count.
///
/// The cache is not `Sync`. Share it behind one lock per instance.
#[derive(Debug)]
pub struct TtlCache<K: Hash + Eq, V, C = SystemClock, S = UnitSize> {
    timer: Timer<C>,
    ttl: Duration,
    entries: Entries<K, V, S>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone + Debug,
{
    // == Constructor ==
    /// Creates a cache holding at most `maxsize` entries on the system clock.
    pub fn new(maxsize: usize, ttl: Duration) -> Self {
        Self::with_sizer(maxsize, ttl, SystemClock, UnitSize)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Hash + Eq + Clone + Debug,
    C: Clock,
{
    /// Creates an entry-counted cache on a custom clock.
    pub fn with_clock(maxsize: usize, ttl: Duration, clock: C) -> Self {
        Self::with_sizer(maxsize, ttl, clock, UnitSize)
    }
}

impl<K, V, C, S> TtlCache<K, V, C, S>
where
    K: Hash + Eq + Clone + Debug,
    C: Clock,
    S: Sizer<V>,
{
    /// Creates a cache with a custom clock and value sizer.
    pub fn with_sizer(maxsize: usize, ttl: Duration, clock: C, sizer: S) -> Self {
        Self {
            timer: Timer::new(clock),
            ttl,
            entries: Entries::new(maxsize, sizer),
        }
    }

    // == Contains ==
    /// Returns true if `key` is stored and not yet expired.
    ///
    /// Neither purges nor changes LRU order.
    pub fn contains(&self, key: &K) -> bool {
        let scope = self.timer.enter();
        self.entries
            .expiry
            .get(key)
            .is_some_and(|expires_at| expires_at >= scope.time())
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    ///
    /// An expired key fails with [`CacheError::NotFound`] just like a
    /// missing one.
    pub fn get(&mut self, key: &K) -> Result<&V> {
        let scope = self.timer.enter();
        self.entries.get(key, scope.time())
    }

    /// Like [`TtlCache::get`], falling back to `default` on a miss.
    pub fn get_or<'a>(&'a mut self, key: &K, default: &'a V) -> &'a V {
        let scope = self.timer.enter();
        self.entries.get(key, scope.time()).unwrap_or(default)
    }

    /// Returns the live value for `key`, inserting `make()` first if there
    /// is none.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> Result<&V>
    where
        F: FnOnce() -> V,
    {
        let scope = self.timer.enter();
        let now = scope.time();
        if !self.contains(&key) {
            self.entries.set(key.clone(), make(), now, self.ttl)?;
        }
        self.entries.get(&key, now)
    }

    // == Set ==
    /// Stores `value` under `key` with a fresh TTL.
    ///
    /// Purges expired entries first, then evicts least recently used live
    /// entries until the value fits. Overwriting an existing key renews its
    /// TTL but leaves its LRU position unchanged.
    pub fn set(&mut self, key: K, value: V) -> Result<()> {
        let scope = self.timer.enter();
        self.entries.set(key, value, scope.time(), self.ttl)
    }

    // == Delete ==
    /// Removes `key` and returns its value.
    ///
    /// An expired key is removed too, but reported as
    /// [`CacheError::NotFound`].
    pub fn delete(&mut self, key: &K) -> Result<V> {
        let scope = self.timer.enter();
        self.entries.delete(key, scope.time())
    }

    // == Pop ==
    /// Removes and returns the live value for `key`.
    ///
    /// Unlike [`TtlCache::delete`], an expired key is left for the next
    /// purge.
    pub fn pop(&mut self, key: &K) -> Result<V> {
        let scope = self.timer.enter();
        let now = scope.time();
        if !self.contains(key) {
            return Err(CacheError::not_found(key));
        }
        self.entries.get(key, now)?;
        self.entries.delete(key, now)
    }

    // == Pop LRU ==
    /// Removes and returns the least recently used live entry.
    pub fn pop_lru(&mut self) -> Result<(K, V)> {
        let scope = self.timer.enter();
        let now = scope.time();
        self.entries.purge(now);

        let key = self
            .entries
            .lru
            .peek_oldest()
            .cloned()
            .ok_or(CacheError::Empty)?;
        let value = self.entries.delete(&key, now)?;
        Ok((key, value))
    }

    // == Expire ==
    /// Purges every expired entry now and returns how many were removed.
    pub fn expire(&mut self) -> usize {
        let scope = self.timer.enter();
        self.entries.purge(scope.time()).len()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        let scope = self.timer.enter();
        self.entries.purge(scope.time());
        self.entries.clear();
    }

    // == Iteration ==
    /// Iterates live `(key, value)` pairs, soonest expiry first.
    ///
    /// Each step checks expiry against the current snapshot, so entries
    /// that expire mid-iteration are skipped. LRU order is not touched.
    pub fn iter(&self) -> Iter<'_, K, V, C, S> {
        Iter {
            expiry: self.entries.expiry.iter(),
            store: &self.entries.store,
            timer: &self.timer,
        }
    }

    /// Iterates live keys, soonest expiry first.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    // == Length ==
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.live_len(self.timer.now())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Size ==
    /// Accounted size of the live entries, after purging expired ones.
    pub fn current_size(&mut self) -> usize {
        let scope = self.timer.enter();
        self.entries.purge(scope.time());
        self.entries.store.current_size()
    }

    pub fn maxsize(&self) -> usize {
        self.entries.store.maxsize()
    }

    // == Time To Live ==
    /// The lifetime given to every entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Time left before `key` expires, or `None` if it is not live.
    pub fn ttl_remaining(&self, key: &K) -> Option<Duration> {
        let now = self.timer.now();
        self.entries
            .expiry
            .get(key)
            .filter(|expires_at| *expires_at >= now)
            .map(|expires_at| expires_at - now)
    }

    // == Accessors ==
    pub fn clock(&self) -> &C {
        self.timer.clock()
    }

    /// The snapshot timer; open a scope on it to pin "now" across reads.
    pub fn timer(&self) -> &Timer<C> {
        &self.timer
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.entries.stats.snapshot(self.len())
    }

    // == State ==
    /// Captures the full contents, expired entries included.
    pub fn to_state(&self) -> CacheState<K, V>
    where
        V: Clone,
    {
        let entries = self
            .entries
            .expiry
            .iter()
            .filter_map(|(key, expires_at)| {
                self.entries.store.get(key).map(|value| StateEntry {
                    key: key.clone(),
                    value: value.clone(),
                    expires_at: *expires_at,
                })
            })
            .collect();

        CacheState {
            maxsize: self.maxsize(),
            ttl: self.ttl,
            entries,
            lru_order: self.entries.lru.iter().cloned().collect(),
        }
    }

    /// Rebuilds a cache from `state`, then purges whatever expired in the
    /// meantime according to `clock`.
    pub fn restore(state: CacheState<K, V>, clock: C, sizer: S) -> Result<Self> {
        let mut cache = Self::with_sizer(state.maxsize, state.ttl, clock, sizer);
        let entries = &mut cache.entries;

        let mut last_expiry = Duration::ZERO;
        for StateEntry {
            key,
            value,
            expires_at,
        } in state.entries
        {
            if entries.store.contains_key(&key) {
                return Err(CacheError::InvalidState(format!(
                    "duplicate key {:?}",
                    key
                )));
            }
            if expires_at < last_expiry {
                return Err(CacheError::InvalidState(format!(
                    "entry {:?} is out of expiry order",
                    key
                )));
            }
            let size = entries.store.size_of(&value);
            if entries.store.current_size() + size > entries.store.maxsize() {
                return Err(CacheError::InvalidState(format!(
                    "entries exceed maxsize {}",
                    entries.store.maxsize()
                )));
            }

            let mut evictor = LruEvictor {
                expiry: &mut entries.expiry,
                lru: &mut entries.lru,
                stats: &mut entries.stats,
            };
            entries.store.insert(key.clone(), value, &mut evictor)?;
            entries.expiry.record(key, expires_at);
            last_expiry = expires_at;
        }

        for key in state.lru_order {
            if !entries.store.contains_key(&key) || entries.lru.contains(&key) {
                return Err(CacheError::InvalidState(format!(
                    "LRU order lists unknown or repeated key {:?}",
                    key
                )));
            }
            entries.lru.insert(key);
        }
        if entries.lru.len() != entries.store.len() {
            return Err(CacheError::InvalidState(
                "LRU order does not cover every entry".to_string(),
            ));
        }

        let purged = cache.expire();
        debug!(
            "Restored cache with {} entries ({} expired on restore)",
            cache.entries.store.len(),
            purged
        );
        Ok(cache)
    }
}

// == Iterator ==
/// Iterator over live entries; see [`TtlCache::iter`].
pub struct Iter<'a, K, V, C, S> {
    expiry: expiry::Iter<'a, K>,
    store: &'a BoundedStore<K, V, S>,
    timer: &'a Timer<C>,
}

impl<'a, K, V, C, S> Iterator for Iter<'a, K, V, C, S>
where
    K: Hash + Eq,
    C: Clock,
    S: Sizer<V>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, expires_at) in self.expiry.by_ref() {
            let scope = self.timer.enter();
            if *expires_at < scope.time() {
                continue;
            }
            let store = self.store;
            if let Some(value) = store.get(key) {
                return Some((key, value));
            }
        }
        None
    }
}
