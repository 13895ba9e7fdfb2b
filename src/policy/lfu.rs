//! # LFU (Least Frequently Used)
//!
//! Evicts the entry with the lowest access count; among equals, the one
//! touched least recently.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, SlotId>        slots: SlotArena<Node>
//!                                       Node { key, item, freq, prev, next }
//!
//!   buckets: FxHashMap<u64, FreqBucket>, linked in frequency order
//!
//!   min_freq ─► [freq 1] ◄──► [freq 3] ◄──► [freq 7]
//!                  │              │              │
//!                head           head           head     (most recently touched)
//!                  ▼              ▼              ▼
//!                 d ◄► c          a              b
//!                      ▲
//!                    tail  ◄── next victim
//! ```
//!
//! ## Access
//!
//! ```text
//!   get(c): unlink c from bucket 1, freq 1 → 2
//!           bucket 2 missing → create it between 1 and 3
//!           push c to the front of bucket 2
//!
//!   if bucket 1 had become empty it is dropped, and min_freq moves to
//!   its successor (the true next occupied frequency)
//! ```
//!
//! A put on an existing key counts as an access: the value and expiry are
//! replaced and the entry moves up one frequency.
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `put`     | O(1)       |
//! | `get`     | O(1)       |
//! | `remove`  | O(1)       |
//! | eviction  | O(1)       |

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::config::CacheOptions;
use crate::ds::{SlotArena, SlotId};
use crate::entry::{Expirable, Item};
use crate::error::Result;
use crate::policy::ConcurrentCache;
use crate::traits::{Lookup, PolicyCore, Removal};

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    item: Item<V>,
    freq: u64,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug, Default)]
struct FreqList {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl FreqList {
    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Default)]
struct FreqBucket {
    list: FreqList,
    prev: Option<u64>,
    next: Option<u64>,
}

/// LFU policy core. See the module docs.
#[derive(Debug)]
pub struct LfuCore<K, V> {
    slots: SlotArena<Node<K, V>>,
    index: FxHashMap<K, SlotId>,
    buckets: FxHashMap<u64, FreqBucket>,
    min_freq: u64,
    capacity: usize,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// `capacity` must be positive; [`PolicyCore::from_options`] checks it.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: SlotArena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            min_freq: 0,
            capacity,
        }
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.slots.get(id).map(|node| node.freq)
    }

    /// Lowest occupied frequency, or 0 when empty.
    pub fn min_frequency(&self) -> u64 {
        self.min_freq
    }

    /// The entry `put` would evict next.
    pub fn peek_lfu(&self) -> Option<(&K, &V)> {
        let bucket = self.buckets.get(&self.min_freq)?;
        let node = self.slots.get(bucket.list.tail?)?;
        Some((&node.key, &node.item.value))
    }

    fn list_push_front(slots: &mut SlotArena<Node<K, V>>, list: &mut FreqList, id: SlotId) {
        let old_head = list.head;
        if let Some(node) = slots.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => {
                if let Some(node) = slots.get_mut(head) {
                    node.prev = Some(id);
                }
            },
            None => list.tail = Some(id),
        }
        list.head = Some(id);
        list.len += 1;
    }

    fn list_remove(slots: &mut SlotArena<Node<K, V>>, list: &mut FreqList, id: SlotId) {
        let (prev, next) = match slots.get(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(prev_id) => {
                if let Some(node) = slots.get_mut(prev_id) {
                    node.next = next;
                }
            },
            None => list.head = next,
        }
        match next {
            Some(next_id) => {
                if let Some(node) = slots.get_mut(next_id) {
                    node.prev = prev;
                }
            },
            None => list.tail = prev,
        }
        if let Some(node) = slots.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
        list.len = list.len.saturating_sub(1);
    }

    fn insert_bucket(&mut self, freq: u64, prev: Option<u64>, next: Option<u64>) {
        self.buckets.insert(
            freq,
            FreqBucket {
                list: FreqList::default(),
                prev,
                next,
            },
        );
        if let Some(bucket) = prev.and_then(|p| self.buckets.get_mut(&p)) {
            bucket.next = Some(freq);
        }
        if let Some(bucket) = next.and_then(|n| self.buckets.get_mut(&n)) {
            bucket.prev = Some(freq);
        }
        if prev.is_none() {
            self.min_freq = freq;
        }
    }

    /// Drops an empty bucket and splices its neighbours together.
    fn remove_bucket(&mut self, freq: u64) {
        let Some(bucket) = self.buckets.remove(&freq) else {
            return;
        };
        if let Some(prev) = bucket.prev.and_then(|p| self.buckets.get_mut(&p)) {
            prev.next = bucket.next;
        }
        if let Some(next) = bucket.next.and_then(|n| self.buckets.get_mut(&n)) {
            next.prev = bucket.prev;
        }
        if bucket.prev.is_none() {
            self.min_freq = bucket.next.unwrap_or(0);
        }
    }

    /// Unlinks `id` from its bucket. Returns the bucket's neighbours and
    /// whether the bucket was dropped for being empty.
    fn detach(&mut self, id: SlotId) -> (Option<u64>, Option<u64>, bool) {
        let Some(freq) = self.slots.get(id).map(|node| node.freq) else {
            return (None, None, false);
        };
        let Some(bucket) = self.buckets.get_mut(&freq) else {
            return (None, None, false);
        };
        Self::list_remove(&mut self.slots, &mut bucket.list, id);
        let (prev, next, emptied) = (bucket.prev, bucket.next, bucket.list.is_empty());
        if emptied {
            self.remove_bucket(freq);
        }
        (prev, next, emptied)
    }

    /// Pushes `id` onto bucket `freq`, creating it between `prev` and `next`
    /// if needed.
    fn attach(&mut self, id: SlotId, freq: u64, prev: Option<u64>, next: Option<u64>) {
        if let Some(node) = self.slots.get_mut(id) {
            node.freq = freq;
        }
        if !self.buckets.contains_key(&freq) {
            self.insert_bucket(freq, prev, next);
        }
        if let Some(bucket) = self.buckets.get_mut(&freq) {
            Self::list_push_front(&mut self.slots, &mut bucket.list, id);
        }
    }

    /// Moves `id` one frequency up.
    fn bump(&mut self, id: SlotId) {
        let Some(old) = self.slots.get(id).map(|node| node.freq) else {
            return;
        };
        let new = old.saturating_add(1);
        if new == old {
            return;
        }
        let (prev, next, emptied) = self.detach(id);
        let prev = if emptied { prev } else { Some(old) };
        self.attach(id, new, prev, next);
    }

    fn unlink(&mut self, id: SlotId) -> Option<(K, Item<V>)> {
        self.detach(id);
        let node = self.slots.remove(id)?;
        self.index.remove(&node.key);
        Some((node.key, node.item))
    }

    fn evict_min_freq(&mut self) -> Option<(K, Item<V>)> {
        let id = self.buckets.get(&self.min_freq)?.list.tail?;
        self.unlink(id)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.index.len() <= self.capacity);
        assert_eq!(self.index.len(), self.slots.len());

        if self.index.is_empty() {
            assert_eq!(self.min_freq, 0);
            assert!(self.buckets.is_empty());
            return;
        }

        assert!(self.min_freq > 0);
        assert!(self.buckets.contains_key(&self.min_freq));
        let lowest = self.buckets.keys().copied().min().unwrap_or(0);
        assert_eq!(self.min_freq, lowest, "min_freq is not the lowest bucket");

        let mut total = 0usize;
        for (&freq, bucket) in &self.buckets {
            assert!(!bucket.list.is_empty());
            match bucket.prev {
                Some(prev) => {
                    assert!(prev < freq);
                    assert_eq!(self.buckets[&prev].next, Some(freq));
                },
                None => assert_eq!(self.min_freq, freq),
            }
            if let Some(next) = bucket.next {
                assert!(next > freq);
                assert_eq!(self.buckets[&next].prev, Some(freq));
            }

            let mut current = bucket.list.head;
            let mut last = None;
            let mut count = 0usize;
            while let Some(id) = current {
                let node = self.slots.get(id).expect("lfu slot missing");
                assert_eq!(node.freq, freq);
                assert_eq!(node.prev, last);
                assert_eq!(self.index.get(&node.key), Some(&id));
                last = Some(id);
                current = node.next;
                count += 1;
            }
            assert_eq!(bucket.list.tail, last);
            assert_eq!(bucket.list.len, count);
            total += count;
        }
        assert_eq!(total, self.index.len());
    }
}

impl<K, V> PolicyCore<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    const NAME: &'static str = "lfu";

    fn from_options(options: &CacheOptions) -> Result<Self> {
        Ok(Self::new(options.require_capacity(Self::NAME)?))
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn put(&mut self, key: K, value: V, expires_at: Option<Instant>, _now: Instant) -> Vec<(K, V)> {
        if let Some(&id) = self.index.get(&key) {
            if let Some(node) = self.slots.get_mut(id) {
                node.item = Item::new(value, expires_at);
            }
            self.bump(id);
            return Vec::new();
        }

        let mut evicted = Vec::new();
        if self.index.len() >= self.capacity {
            if let Some((key, item)) = self.evict_min_freq() {
                evicted.push((key, item.value));
            }
        }

        let id = self.slots.insert(Node {
            key: key.clone(),
            item: Item::new(value, expires_at),
            freq: 1,
            prev: None,
            next: None,
        });
        self.index.insert(key, id);
        let next = (self.min_freq != 0).then_some(self.min_freq);
        self.attach(id, 1, None, next);
        evicted
    }

    fn get(&mut self, key: &K, now: Instant) -> Lookup<K, V> {
        let Some(&id) = self.index.get(key) else {
            return Lookup::Miss;
        };
        let expired = self
            .slots
            .get(id)
            .is_some_and(|node| node.item.is_expired_at(now));
        if expired {
            return match self.unlink(id) {
                Some((key, item)) => Lookup::Expired(key, item.value),
                None => Lookup::Miss,
            };
        }
        self.bump(id);
        match self.slots.get(id) {
            Some(node) => Lookup::Hit(node.item.value.clone()),
            None => Lookup::Miss,
        }
    }

    fn remove(&mut self, key: &K, now: Instant) -> Removal<K, V> {
        let Some(&id) = self.index.get(key) else {
            return Removal::Absent;
        };
        match self.unlink(id) {
            Some((key, item)) if item.is_expired_at(now) => Removal::Expired(key, item.value),
            Some((key, item)) => Removal::Removed(key, item.value),
            None => Removal::Absent,
        }
    }

    fn contains(&self, key: &K, now: Instant) -> bool {
        self.index
            .get(key)
            .and_then(|&id| self.slots.get(id))
            .is_some_and(|node| !node.item.is_expired_at(now))
    }

    fn drain_expired(&mut self, now: Instant) -> Vec<(K, V)> {
        let expired: Vec<SlotId> = self
            .slots
            .iter()
            .filter(|(_, node)| node.item.is_expired_at(now))
            .map(|(id, _)| id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.unlink(id))
            .map(|(key, item)| (key, item.value))
            .collect()
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        let ids: Vec<SlotId> = self.slots.iter().map(|(id, _)| id).collect();
        let drained = ids
            .into_iter()
            .filter_map(|id| self.slots.remove(id))
            .map(|node| (node.key, node.item.value))
            .collect();
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
        drained
    }
}

/// Thread-safe LFU cache.
pub type LfuCache<K, V> = ConcurrentCache<LfuCore<K, V>, K, V>;

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Current access count of `key`, expired or not.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inspect(|core| core.frequency(key))
    }
}
