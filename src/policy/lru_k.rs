//! # LRU-K
//!
//! Keys earn residency by being put `k` times. Until then they live in a
//! value-less history list that only counts accesses.
//!
//! ```text
//!   history: LruList<K, HistoryEntry { freq, last_update }>   (capacity)
//!   main:    LruList<K, Item<V>>                               (capacity)
//!
//!   put(k):
//!     in main     → update value + expiry, move to front
//!     in history  → freq -= floor(idle / min_update_interval)   (>= 0)
//!                   freq += 1, last_update = now
//!                   freq >= k ? move into main : move to history front
//!     otherwise   → history entry with freq = 1
//!                   (k <= 1 promotes straight into main)
//! ```
//!
//! The decay keeps a key that was hot long ago from being promoted by a
//! single late access. History entries hold no value and never expire; the
//! oldest one is dropped silently when the history list is full.
//!
//! Only `main` is visible to `get`, `remove`, `len` and expiry.

use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::config::CacheOptions;
use crate::entry::{Entry, HistoryEntry, Item};
use crate::error::Result;
use crate::policy::ConcurrentCache;
use crate::policy::lru::{LruList, lookup_of, removal_of};
use crate::traits::{Lookup, PolicyCore, Removal};

#[derive(Debug)]
pub struct LrukCore<K, V> {
    history: LruList<K, HistoryEntry>,
    main: LruList<K, Item<V>>,
    k: usize,
    min_update_interval: Duration,
}

impl<K, V> LrukCore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize, k: usize, min_update_interval: Duration) -> Self {
        Self {
            history: LruList::new(capacity),
            main: LruList::new(capacity),
            k,
            min_update_interval,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Access count of a key that has not been promoted yet.
    pub fn history_frequency(&self, key: &K) -> Option<usize> {
        self.history.peek(key).map(|entry| entry.freq)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Resident keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.main.keys()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.history.debug_validate_invariants();
        self.main.debug_validate_invariants();
        for key in self.history.keys() {
            assert!(!self.main.contains_key(key), "key both in history and main");
        }
    }
}

impl<K, V> PolicyCore<K, V> for LrukCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    const NAME: &'static str = "lru-k";

    fn from_options(options: &CacheOptions) -> Result<Self> {
        let capacity = options.require_capacity(Self::NAME)?;
        let k = options.require_lru_k()?;
        Ok(Self::new(
            capacity,
            k,
            options.effective_lru_k_min_update_interval(),
        ))
    }

    fn capacity(&self) -> usize {
        self.main.capacity()
    }

    fn len(&self) -> usize {
        self.main.len()
    }

    fn put(&mut self, key: K, value: V, expires_at: Option<Instant>, now: Instant) -> Vec<(K, V)> {
        let item = Item::new(value, expires_at);
        if self.main.contains_key(&key) {
            self.main.insert(key, item);
            return Vec::new();
        }

        let promote = match self.history.peek_mut(&key) {
            Some(entry) => {
                entry.record_access(now, self.min_update_interval);
                entry.freq >= self.k
            },
            None if self.k <= 1 => true,
            None => {
                self.history.insert(key, HistoryEntry::first_seen(now));
                return Vec::new();
            },
        };

        if !promote {
            self.history.touch(&key);
            return Vec::new();
        }
        self.history.remove(&key);
        self.main
            .insert(key, item)
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
        self.history.drain();
        self.main.drain().into_iter().map(Entry::into_pair).collect()
    }
}

/// Thread-safe LRU-K cache.
pub type LrukCache<K, V> = ConcurrentCache<LrukCore<K, V>, K, V>;
