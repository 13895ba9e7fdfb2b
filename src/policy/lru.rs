//! # LRU (Least Recently Used)
//!
//! A key index over an [`IntrusiveList`] ordered by recency. `get` and
//! `put` move the entry to the front; a put that pushes the length past
//! capacity evicts the tail.
//!
//! ```text
//!   index: FxHashMap<K, SlotId>
//!             │
//!             ▼
//!   head (MRU) ─► [c] ◄──► [a] ◄──► [b] ◄── tail (LRU, next victim)
//!
//!   put(d) with capacity 3:
//!   head ─► [d] ◄──► [c] ◄──► [a] ◄── tail        b evicted
//! ```
//!
//! [`LruList`] is the keyed recency list on its own, generic over what each
//! node carries. 2Q, LRU-K and LRU-MQ build their queues out of it.
//!
//! | Operation        | Complexity |
//! |------------------|------------|
//! | `put` / `get`    | O(1)       |
//! | `remove`         | O(1)       |
//! | `drain_expired`  | O(n)       |

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::config::CacheOptions;
use crate::ds::{IntrusiveList, SlotId};
use crate::entry::{Entry, Expirable, Item};
use crate::error::Result;
use crate::policy::ConcurrentCache;
use crate::traits::{Lookup, PolicyCore, Removal};

/// Outcome of [`LruList::access`].
#[derive(Debug)]
pub enum Access<'a, K, T> {
    Hit(&'a mut T),
    Expired(Entry<K, T>),
    Miss,
}

/// Keyed recency list. Front is most recently used.
#[derive(Debug)]
pub struct LruList<K, T> {
    index: FxHashMap<K, SlotId>,
    list: IntrusiveList<Entry<K, T>>,
    capacity: usize,
}

impl<K, T> LruList<K, T>
where
    K: Eq + Hash + Clone,
    T: Expirable,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            list: IntrusiveList::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Presence in the index, expired or not.
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// `true` if `key` is present and not expired at `now`.
    pub fn contains_live(&self, key: &K, now: Instant) -> bool {
        self.peek(key).is_some_and(|item| !item.is_expired_at(now))
    }

    /// Reads without touching recency.
    pub fn peek(&self, key: &K) -> Option<&T> {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|entry| &entry.item)
    }

    pub fn peek_mut(&mut self, key: &K) -> Option<&mut T> {
        let id = *self.index.get(key)?;
        self.list.get_mut(id).map(|entry| &mut entry.item)
    }

    /// Moves `key` to the front. Returns `false` if absent.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&id) => self.list.move_to_front(id),
            None => false,
        }
    }

    /// Looks up `key`, unlinking it if expired and promoting it otherwise.
    pub fn access(&mut self, key: &K, now: Instant) -> Access<'_, K, T> {
        let Some(&id) = self.index.get(key) else {
            return Access::Miss;
        };
        let expired = self
            .list
            .get(id)
            .is_some_and(|entry| entry.item.is_expired_at(now));
        if expired {
            return match self.unlink(id) {
                Some(entry) => Access::Expired(entry),
                None => Access::Miss,
            };
        }
        self.list.move_to_front(id);
        match self.list.get_mut(id) {
            Some(entry) => Access::Hit(&mut entry.item),
            None => Access::Miss,
        }
    }

    /// Inserts at the front, or replaces and promotes an existing entry.
    ///
    /// Returns the tail entry if the insert pushed the list over capacity.
    pub fn insert(&mut self, key: K, item: T) -> Option<Entry<K, T>> {
        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.list.get_mut(id) {
                entry.item = item;
            }
            self.list.move_to_front(id);
            return None;
        }

        let id = self.list.push_front(Entry::new(key.clone(), item));
        self.index.insert(key, id);
        if self.index.len() > self.capacity {
            return self.pop_lru();
        }
        None
    }

    pub fn remove(&mut self, key: &K) -> Option<Entry<K, T>> {
        let id = self.index.remove(key)?;
        self.list.remove(id)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<Entry<K, T>> {
        let entry = self.list.pop_back()?;
        self.index.remove(&entry.key);
        Some(entry)
    }

    pub fn peek_lru(&self) -> Option<&Entry<K, T>> {
        self.list.back_id().and_then(|id| self.list.get(id))
    }

    /// Keys from least to most recently used.
    pub fn keys_lru_first(&self) -> Vec<K> {
        self.list
            .iter_ids_rev()
            .filter_map(|id| self.list.get(id).map(|entry| entry.key.clone()))
            .collect()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.list.iter().map(|entry| &entry.key)
    }

    pub fn drain_expired(&mut self, now: Instant) -> Vec<Entry<K, T>> {
        let expired: Vec<SlotId> = self
            .list
            .iter_ids()
            .filter(|&id| {
                self.list
                    .get(id)
                    .is_some_and(|entry| entry.item.is_expired_at(now))
            })
            .collect();
        expired.into_iter().filter_map(|id| self.unlink(id)).collect()
    }

    /// Empties the list, most recently used first.
    pub fn drain(&mut self) -> Vec<Entry<K, T>> {
        self.index.clear();
        self.list.drain()
    }

    pub fn slots_reused(&self) -> u64 {
        self.list.slots_reused()
    }

    fn unlink(&mut self, id: SlotId) -> Option<Entry<K, T>> {
        let entry = self.list.remove(id)?;
        self.index.remove(&entry.key);
        Some(entry)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
        assert_eq!(self.list.len(), self.index.len());
        assert!(self.len() <= self.capacity);
        for (key, &id) in &self.index {
            let entry = self.list.get(id).expect("indexed slot missing from list");
            assert!(entry.key == *key, "index points at a different key");
        }
    }
}

/// LRU policy core: an [`LruList`] of [`Item`]s.
#[derive(Debug)]
pub struct LruCore<K, V> {
    list: LruList<K, Item<V>>,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// `capacity` must be positive; [`PolicyCore::from_options`] checks it.
    pub fn new(capacity: usize) -> Self {
        Self {
            list: LruList::new(capacity),
        }
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.list.keys()
    }

    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list
            .peek_lru()
            .map(|entry| (&entry.key, &entry.item.value))
    }

    pub fn slots_reused(&self) -> u64 {
        self.list.slots_reused()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
    }
}

impl<K, V> PolicyCore<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    const NAME: &'static str = "lru";

    fn from_options(options: &CacheOptions) -> Result<Self> {
        Ok(Self::new(options.require_capacity(Self::NAME)?))
    }

    fn capacity(&self) -> usize {
        self.list.capacity()
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn put(&mut self, key: K, value: V, expires_at: Option<Instant>, _now: Instant) -> Vec<(K, V)> {
        self.list
            .insert(key, Item::new(value, expires_at))
            .map(Entry::into_pair)
            .into_iter()
            .collect()
    }

    fn get(&mut self, key: &K, now: Instant) -> Lookup<K, V> {
        lookup_of(self.list.access(key, now))
    }

    fn remove(&mut self, key: &K, now: Instant) -> Removal<K, V> {
        removal_of(self.list.remove(key), now)
    }

    fn contains(&self, key: &K, now: Instant) -> bool {
        self.list.contains_live(key, now)
    }

    fn drain_expired(&mut self, now: Instant) -> Vec<(K, V)> {
        self.list
            .drain_expired(now)
            .into_iter()
            .map(Entry::into_pair)
            .collect()
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        self.list.drain().into_iter().map(Entry::into_pair).collect()
    }
}

/// Thread-safe LRU cache.
///
/// ```
/// use evictkit::policy::lru::LruCache;
/// use evictkit::traits::CoreCache;
///
/// let cache: LruCache<&str, i32> = LruCache::new(2).unwrap();
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.get(&"a");
/// assert!(cache.put("c", 3)); // evicts "b"
/// assert_eq!(cache.get(&"b"), None);
/// ```
pub type LruCache<K, V> = ConcurrentCache<LruCore<K, V>, K, V>;

/// Classifies an entry unlinked by `remove` as live or expired.
pub(crate) fn removal_of<K, V>(entry: Option<Entry<K, Item<V>>>, now: Instant) -> Removal<K, V> {
    match entry {
        Some(entry) => {
            let expired = entry.item.is_expired_at(now);
            let (key, value) = entry.into_pair();
            if expired {
                Removal::Expired(key, value)
            } else {
                Removal::Removed(key, value)
            }
        },
        None => Removal::Absent,
    }
}

/// Maps an item-list access to a core lookup, cloning the value on a hit.
pub(crate) fn lookup_of<K, V: Clone>(access: Access<'_, K, Item<V>>) -> Lookup<K, V> {
    match access {
        Access::Hit(item) => Lookup::Hit(item.value.clone()),
        Access::Expired(entry) => {
            let (key, value) = entry.into_pair();
            Lookup::Expired(key, value)
        },
        Access::Miss => Lookup::Miss,
    }
}
