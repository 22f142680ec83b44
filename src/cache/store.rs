//! Bounded Store Module
//!
//! Size-accounted key-value storage. When an insert would exceed the budget
//! the store asks an [`Evictor`] which entries to drop; it has no ordering
//! policy of its own.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{CacheError, Result};

// == Sizer ==
/// Measures how much of the store's budget a value occupies.
pub trait Sizer<V> {
    fn size_of(&self, value: &V) -> usize;
}

/// Every value counts as 1, making `maxsize` an entry count.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitSize;

impl<V> Sizer<V> for UnitSize {
    fn size_of(&self, _value: &V) -> usize {
        1
    }
}

/// Values are sized by their byte length.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteSize;

impl<V: AsRef<[u8]>> Sizer<V> for ByteSize {
    fn size_of(&self, value: &V) -> usize {
        value.as_ref().len()
    }
}

impl<V, F> Sizer<V> for F
where
    F: Fn(&V) -> usize,
{
    fn size_of(&self, value: &V) -> usize {
        self(value)
    }
}

// == Evictor ==
/// Eviction-order strategy supplied to [`BoundedStore::insert`].
pub trait Evictor<K, V> {
    /// Picks the next key to evict, or `None` if nothing is left.
    fn select_victim(&mut self) -> Option<K>;

    /// Called with every pair the store evicted on the strategy's advice.
    fn evicted(&mut self, key: &K, value: V);
}

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    size: usize,
}

// == Bounded Store ==
/// Key-value storage whose accounted size never exceeds `maxsize`.
#[derive(Debug)]
pub struct BoundedStore<K, V, S> {
    entries: HashMap<K, Slot<V>>,
    current_size: usize,
    maxsize: usize,
    sizer: S,
}

impl<K, V, S> BoundedStore<K, V, S>
where
    K: Hash + Eq,
    S: Sizer<V>,
{
    // == Constructor ==
    pub fn new(maxsize: usize, sizer: S) -> Self {
        Self {
            entries: HashMap::new(),
            current_size: 0,
            maxsize,
            sizer,
        }
    }

    // == Insert ==
    /// Stores `value` under `key`, evicting until it fits.
    ///
    /// Eviction only runs when the key is new or its value grows, and keeps
    /// going while `current_size + size > maxsize`. Fails without touching
    /// anything if the value alone is larger than `maxsize`.
    pub fn insert<E>(&mut self, key: K, value: V, evictor: &mut E) -> Result<()>
    where
        E: Evictor<K, V>,
    {
        let size = self.sizer.size_of(&value);
        if size > self.maxsize {
            return Err(CacheError::ValueTooLarge {
                size,
                maxsize: self.maxsize,
            });
        }

        let grows = self
            .entries
            .get(&key)
            .map_or(true, |slot| slot.size < size);
        if grows {
            while self.current_size + size > self.maxsize {
                let victim = evictor.select_victim().ok_or_else(|| {
                    CacheError::Internal("no eviction candidate while over capacity".to_string())
                })?;
                let evicted = self.remove(&victim).ok_or_else(|| {
                    CacheError::Internal("eviction candidate missing from store".to_string())
                })?;
                evictor.evicted(&victim, evicted);
            }
        }

        if let Some(old) = self.entries.insert(key, Slot { value, size }) {
            self.current_size -= old.size;
        }
        self.current_size += size;
        Ok(())
    }

    // == Lookup ==
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    // == Remove ==
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.entries.remove(key)?;
        self.current_size -= slot.size;
        Some(slot.value)
    }

    /// Size `value` would occupy if stored.
    pub fn size_of(&self, value: &V) -> usize {
        self.sizer.size_of(value)
    }

    // == Accounting ==
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in the store's own (unspecified) order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
    }
}
