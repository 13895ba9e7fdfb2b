//! # 2Q (admission-filtered LRU)
//!
//! A key must be put twice before it becomes readable. The first put only
//! records the key in a bounded FIFO; the second moves it into the main LRU.
//! One-off writes therefore never displace resident entries.
//!
//! ```text
//!   put(k) ──► pending in fifo? ──no──► record placeholder, return false
//!                    │ yes                (oldest placeholder may drop)
//!                    ▼
//!              remove from fifo, insert into main (main tail may evict)
//!
//!   fifo: keys only, capacity = capacity, never visible to readers
//!   main: LRU of items, capacity = capacity
//! ```
//!
//! Residency in `main` does not bypass the filter: a new value for an admitted
//! key is only written on the put that finds the key pending, so readers keep
//! seeing the old value in between.
//!
//! `get`, `remove`, `len`, `contains` and expiry only ever look at `main`.
//! Placeholders carry no value, so dropping one fires no callback.

use std::hash::Hash;
use std::time::Instant;

use crate::config::CacheOptions;
use crate::entry::{Entry, Item};
use crate::error::Result;
use crate::policy::ConcurrentCache;
use crate::policy::lru::{LruList, lookup_of, removal_of};
use crate::traits::{Lookup, PolicyCore, Removal};

#[derive(Debug)]
pub struct TwoQCore<K, V> {
    fifo: LruList<K, ()>,
    main: LruList<K, Item<V>>,
}

impl<K, V> TwoQCore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            fifo: LruList::new(capacity),
            main: LruList::new(capacity),
        }
    }

    /// `true` if `key` has been put once and is waiting for admission.
    pub fn is_pending(&self, key: &K) -> bool {
        self.fifo.contains_key(key)
    }

    pub fn pending_len(&self) -> usize {
        self.fifo.len()
    }

    /// Admitted keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.main.keys()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.fifo.debug_validate_invariants();
        self.main.debug_validate_invariants();
    }
}

impl<K, V> PolicyCore<K, V> for TwoQCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    const NAME: &'static str = "lru-2q";

    fn from_options(options: &CacheOptions) -> Result<Self> {
        Ok(Self::new(options.require_capacity(Self::NAME)?))
    }

    fn capacity(&self) -> usize {
        self.main.capacity()
    }

    fn len(&self) -> usize {
        self.main.len()
    }

    fn put(&mut self, key: K, value: V, expires_at: Option<Instant>, _now: Instant) -> Vec<(K, V)> {
        if self.fifo.remove(&key).is_none() {
            self.fifo.insert(key, ());
            return Vec::new();
        }
        self.main
            .insert(key, Item::new(value, expires_at))
            .map(Entry::into_pair)
            .into_iter()
            .collect()
    }

    fn get(&mut self, key: &K, now: Instant) -> Lookup<K, V> {
        lookup_of(self.main.access(key, now))
    }

    fn remove(&mut self, key: &K, now: Instant) -> Removal<K, V> {
        removal_of(self.main.remove(key), now)
    }

    fn contains(&self, key: &K, now: Instant) -> bool {
        self.main.contains_live(key, now)
    }

    fn drain_expired(&mut self, now: Instant) -> Vec<(K, V)> {
        self.main
            .drain_expired(now)
            .into_iter()
            .map(Entry::into_pair)
            .collect()
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        self.fifo.drain();
        self.main.drain().into_iter().map(Entry::into_pair).collect()
    }
}

/// Thread-safe 2Q cache.
pub type TwoQCache<K, V> = ConcurrentCache<TwoQCore<K, V>, K, V>;
