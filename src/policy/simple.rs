//! # Simple
//!
//! An unbounded hash map with per-entry expiry. Nothing is ever evicted for
//! space, so `put` never reports an eviction and the configured capacity is
//! only echoed back by [`capacity`](PolicyCore::capacity). Expired entries
//! leave through lazy reads or the sweeper.

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::config::CacheOptions;
use crate::entry::{Expirable, Item};
use crate::error::Result;
use crate::policy::ConcurrentCache;
use crate::traits::{Lookup, PolicyCore, Removal};

#[derive(Debug)]
pub struct SimpleCore<K, V> {
    map: FxHashMap<K, Item<V>>,
    capacity: usize,
}

impl<K, V> SimpleCore<K, V>
where
    K: Eq + Hash,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }
}

impl<K, V> PolicyCore<K, V> for SimpleCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    const NAME: &'static str = "simple";

    /// Any capacity, including zero, is accepted.
    fn from_options(options: &CacheOptions) -> Result<Self> {
        Ok(Self::new(options.capacity))
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn put(&mut self, key: K, value: V, expires_at: Option<Instant>, _now: Instant) -> Vec<(K, V)> {
        self.map.insert(key, Item::new(value, expires_at));
        Vec::new()
    }

    fn get(&mut self, key: &K, now: Instant) -> Lookup<K, V> {
        let Some(item) = self.map.get(key) else {
            return Lookup::Miss;
        };
        if !item.is_expired_at(now) {
            return Lookup::Hit(item.value.clone());
        }
        match self.map.remove_entry(key) {
            Some((key, item)) => Lookup::Expired(key, item.value),
            None => Lookup::Miss,
        }
    }

    fn remove(&mut self, key: &K, now: Instant) -> Removal<K, V> {
        match self.map.remove_entry(key) {
            Some((key, item)) if item.is_expired_at(now) => Removal::Expired(key, item.value),
            Some((key, item)) => Removal::Removed(key, item.value),
            None => Removal::Absent,
        }
    }

    fn contains(&self, key: &K, now: Instant) -> bool {
        self.map.get(key).is_some_and(|item| !item.is_expired_at(now))
    }

    fn drain_expired(&mut self, now: Instant) -> Vec<(K, V)> {
        let expired: Vec<K> = self
            .map
            .iter()
            .filter(|(_, item)| item.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        expired
            .iter()
            .filter_map(|key| self.map.remove_entry(key))
            .map(|(key, item)| (key, item.value))
            .collect()
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        self.map
            .drain()
            .map(|(key, item)| (key, item.value))
            .collect()
    }
}

/// Thread-safe unbounded TTL map.
pub type SimpleCache<K, V> = ConcurrentCache<SimpleCore<K, V>, K, V>;
