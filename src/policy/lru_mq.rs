//! # LRU-MQ (multi-queue LRU)
//!
//! A main LRU holds the values; `mq_levels + 1` key-only LRU queues record
//! which priority level each resident key currently sits in.
//!
//! ```text
//!   main:   LruList<K, MqEntry { item, freq, level }>      (capacity)
//!
//!   levels[mq_levels]  hot   [e] ◄──► [a]
//!   ...
//!   levels[1]                [d] ◄──► [b]     ◄── new keys land here
//!   levels[0]          cold  [c]
//!
//!   epoch (ik): +1 every lru_k_min_update_interval
//!   level(entry) = clamp((freq - ik) / k, 0, mq_levels)
//! ```
//!
//! `freq` starts at the epoch value of the put and gains one per `get`, so
//! `freq - ik` is "accesses since the put, minus epochs elapsed". Keys read
//! often climb; keys left alone sink as the epoch advances. Two periodic
//! jobs run under the cache lock: one advances the epoch, the other walks
//! every level queue from its least recently used end and relinks entries
//! whose level changed.
//!
//! Expiry is lazy only: `get` and `remove` honour it, nothing sweeps.

use std::hash::Hash;
use std::time::Instant;

use crate::config::CacheOptions;
use crate::entry::{Entry, Expirable, Item};
use crate::error::{CacheError, Result};
use crate::policy::ConcurrentCache;
use crate::policy::lru::{Access, LruList};
use crate::traits::{Lookup, Maintenance, PolicyCore, Removal};

/// Level every new or rewritten key starts at.
const ENTRY_LEVEL: usize = 1;

#[derive(Debug, Clone)]
struct MqEntry<V> {
    item: Item<V>,
    freq: i64,
    level: usize,
}

impl<V> Expirable for MqEntry<V> {
    #[inline]
    fn expires_at(&self) -> Option<Instant> {
        self.item.expires_at
    }
}

#[derive(Debug)]
pub struct LruMqCore<K, V> {
    main: LruList<K, MqEntry<V>>,
    levels: Vec<LruList<K, ()>>,
    epoch: i64,
    k: i64,
    mq_levels: usize,
}

impl<K, V> LruMqCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// `capacity`, `k` and `mq_levels` must be positive;
    /// [`PolicyCore::from_options`] checks them.
    pub fn new(capacity: usize, k: usize, mq_levels: usize) -> Self {
        Self {
            main: LruList::new(capacity),
            levels: (0..=mq_levels).map(|_| LruList::new(capacity)).collect(),
            epoch: 0,
            k: i64::try_from(k).unwrap_or(i64::MAX),
            mq_levels,
        }
    }

    pub fn level_of(&self, key: &K) -> Option<usize> {
        self.main.peek(key).map(|entry| entry.level)
    }

    pub fn frequency(&self, key: &K) -> Option<i64> {
        self.main.peek(key).map(|entry| entry.freq)
    }

    /// Epoch counter, reset by `clear`.
    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    /// Keys in `level`, most recently linked first.
    pub fn level_keys(&self, level: usize) -> Vec<K> {
        self.levels
            .get(level)
            .map(|queue| queue.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn advance_epoch(&mut self) {
        self.epoch = self.epoch.saturating_add(1);
    }

    /// Re-evaluates every resident key's level, coldest queue first.
    pub fn rebalance(&mut self) {
        for level in 0..self.levels.len() {
            for key in self.levels[level].keys_lru_first() {
                let target = match self.main.peek_mut(&key) {
                    Some(entry) => {
                        let target = level_for(entry.freq, self.epoch, self.k, self.mq_levels);
                        entry.level = target;
                        target
                    },
                    None => {
                        self.levels[level].remove(&key);
                        continue;
                    },
                };
                if target != level {
                    self.relink(key, level, target);
                }
            }
        }
    }

    fn relink(&mut self, key: K, from: usize, to: usize) {
        self.levels[from].remove(&key);
        // Level queues together never hold more keys than main does.
        let dropped = self.levels[to].insert(key, ());
        debug_assert!(dropped.is_none(), "level queue outgrew main");
    }

    /// Registers `key` in `level`. If that queue overflows, the key it drops
    /// is evicted from main as well.
    fn register(&mut self, key: K, level: usize) -> Option<(K, V)> {
        let dropped = self.levels[level].insert(key, ())?;
        self.main
            .remove(&dropped.key)
            .map(|entry| (entry.key, entry.item.item.value))
    }

    fn unregister(&mut self, key: &K, level: usize) {
        if let Some(queue) = self.levels.get_mut(level) {
            queue.remove(key);
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.main.debug_validate_invariants();
        let mut linked = 0;
        for (level, queue) in self.levels.iter().enumerate() {
            queue.debug_validate_invariants();
            for key in queue.keys() {
                assert_eq!(self.level_of(key), Some(level), "level queue disagrees with entry");
            }
            linked += queue.len();
        }
        assert_eq!(linked, self.main.len());
    }
}

fn level_for(freq: i64, epoch: i64, k: i64, mq_levels: usize) -> usize {
    let raw = freq.saturating_sub(epoch) / k.max(1);
    usize::try_from(raw).unwrap_or(0).min(mq_levels)
}

impl<K, V> PolicyCore<K, V> for LruMqCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    const NAME: &'static str = "lru-mq";
    const SWEEPS: bool = false;

    fn from_options(options: &CacheOptions) -> Result<Self> {
        let capacity = options.require_capacity(Self::NAME)?;
        let k = options.require_lru_k()?;
        if options.mq_levels == 0 {
            return Err(CacheError::InvalidOption {
                option: "mq_levels",
                reason: "must be at least 1",
            });
        }
        Ok(Self::new(capacity, k, options.mq_levels))
    }

    fn capacity(&self) -> usize {
        self.main.capacity()
    }

    fn len(&self) -> usize {
        self.main.len()
    }

    fn put(&mut self, key: K, value: V, expires_at: Option<Instant>, _now: Instant) -> Vec<(K, V)> {
        let entry = MqEntry {
            item: Item::new(value, expires_at),
            freq: self.epoch,
            level: ENTRY_LEVEL,
        };
        let mut evicted = Vec::new();

        if let Some(level) = self.main.peek(&key).map(|entry| entry.level) {
            self.unregister(&key, level);
            self.main.insert(key.clone(), entry);
        } else if let Some(tail) = self.main.insert(key.clone(), entry) {
            self.unregister(&tail.key, tail.item.level);
            evicted.push((tail.key, tail.item.item.value));
        }

        evicted.extend(self.register(key, ENTRY_LEVEL));
        evicted
    }

    fn get(&mut self, key: &K, now: Instant) -> Lookup<K, V> {
        let (epoch, k, mq_levels) = (self.epoch, self.k, self.mq_levels);
        let (value, moved) = match self.main.access(key, now) {
            Access::Hit(entry) => {
                entry.freq = entry.freq.saturating_add(1);
                let from = entry.level;
                entry.level = level_for(entry.freq, epoch, k, mq_levels);
                (entry.item.value.clone(), (from, entry.level))
            },
            Access::Expired(Entry { key, item }) => {
                self.unregister(&key, item.level);
                return Lookup::Expired(key, item.item.value);
            },
            Access::Miss => return Lookup::Miss,
        };
        if moved.0 != moved.1 {
            self.relink(key.clone(), moved.0, moved.1);
        }
        Lookup::Hit(value)
    }

    fn remove(&mut self, key: &K, now: Instant) -> Removal<K, V> {
        let Some(Entry { key, item }) = self.main.remove(key) else {
            return Removal::Absent;
        };
        self.unregister(&key, item.level);
        if item.is_expired_at(now) {
            Removal::Expired(key, item.item.value)
        } else {
            Removal::Removed(key, item.item.value)
        }
    }

    fn contains(&self, key: &K, now: Instant) -> bool {
        self.main.contains_live(key, now)
    }

    fn drain_expired(&mut self, _now: Instant) -> Vec<(K, V)> {
        Vec::new()
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        for queue in &mut self.levels {
            queue.drain();
        }
        self.epoch = 0;
        self.main
            .drain()
            .into_iter()
            .map(|entry| (entry.key, entry.item.item.value))
            .collect()
    }

    fn maintenance(&self, options: &CacheOptions) -> Vec<Maintenance<Self>> {
        vec![
            Maintenance {
                name: "evictkit-mq-epoch",
                interval: options.effective_lru_k_min_update_interval(),
                job: Self::advance_epoch,
            },
            Maintenance {
                name: "evictkit-mq-rebalance",
                interval: options.effective_mq_rebalance_interval(),
                job: Self::rebalance,
            },
        ]
    }
}

/// Thread-safe LRU-MQ cache. Starts its epoch and rebalance threads on
/// construction; no expiry sweeper.
pub type LruMqCache<K, V> = ConcurrentCache<LruMqCore<K, V>, K, V>;

impl<K, V> LruMqCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn level_of(&self, key: &K) -> Option<usize> {
        self.inspect(|core| core.level_of(key))
    }

    pub fn epoch(&self) -> i64 {
        self.inspect(LruMqCore::epoch)
    }
}
