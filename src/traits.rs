//! # Cache Trait Hierarchy
//!
//! Two layers, mirroring how every cache in this crate is built:
//!
//! ```text
//!   ┌─────────────────────────────────────────────┐
//!   │        CoreCache<K, V>   (&self, Sync)      │
//!   │  put · get · remove · contains · len        │
//!   │  capacity · clear                           │
//!   └──────────────────────┬──────────────────────┘
//!                          │
//!   ┌──────────────────────▼──────────────────────┐
//!   │        ExpireCache<K, V>                    │
//!   │  put_with_expire · delete_expired           │
//!   └──────────────────────┬──────────────────────┘
//!                          │ implemented by ConcurrentCache<C, K, V>
//!                          │ (one RwLock around C)
//!   ┌──────────────────────▼──────────────────────┐
//!   │        PolicyCore<K, V>  (&mut self)        │
//!   │  single-threaded eviction engine:           │
//!   │  LruCore · LfuCore · TwoQCore · LrukCore    │
//!   │  LruMqCore · SimpleCore                     │
//!   └─────────────────────────────────────────────┘
//! ```
//!
//! The public traits never return errors. A miss, an expired entry and a
//! capacity eviction are all ordinary outcomes.

use std::time::{Duration, Instant};

use crate::config::CacheOptions;
use crate::error::Result;
use crate::expire::Lifespan;

/// Operations every cache supports, callable from any thread.
pub trait CoreCache<K, V> {
    /// Inserts or updates `key` with no expiry.
    ///
    /// Returns `true` when a different key was evicted to make room.
    fn put(&self, key: K, value: V) -> bool;

    /// Returns a clone of the live value. An expired entry is removed (its
    /// callback fires) and reported as a miss.
    fn get(&self, key: &K) -> Option<V>;

    /// Removes `key`. Returns `true` only if it was present and not yet
    /// expired; an expired entry is still removed.
    fn remove(&self, key: &K) -> bool;

    /// `true` if `key` is readable right now. Does not touch recency or frequency.
    fn contains(&self, key: &K) -> bool;

    /// Indexed entries, counting expired ones that have not been swept yet.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Removes everything. Callbacks for every entry have run when this returns.
    fn clear(&self);
}

/// Caches whose entries may carry a time-to-live.
pub trait ExpireCache<K, V>: CoreCache<K, V> {
    /// Like [`CoreCache::put`], with an explicit lifespan. Updating a key
    /// replaces its previous expiry.
    fn put_with_expire(&self, key: K, value: V, ttl: Lifespan) -> bool;

    /// Removes every expired entry now.
    fn delete_expired(&self);
}

/// Result of a core lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<K, V> {
    Hit(V),
    /// The key was present but expired; it has been unlinked.
    Expired(K, V),
    Miss,
}

/// Result of a core removal.
#[derive(Debug, PartialEq, Eq)]
pub enum Removal<K, V> {
    Removed(K, V),
    /// Present but already expired. Unlinked all the same.
    Expired(K, V),
    Absent,
}

impl<K, V> Removal<K, V> {
    /// The unlinked pair, live or expired.
    pub fn into_entry(self) -> Option<(K, V)> {
        match self {
            Removal::Removed(k, v) | Removal::Expired(k, v) => Some((k, v)),
            Removal::Absent => None,
        }
    }
}

/// A periodic job a core needs besides the expiry sweep.
pub struct Maintenance<C> {
    pub name: &'static str,
    pub interval: Duration,
    pub job: fn(&mut C),
}

/// Single-threaded eviction engine wrapped by [`ConcurrentCache`](crate::policy::ConcurrentCache).
///
/// Every method that unlinks entries hands them back so the wrapper can run
/// callbacks after releasing its lock.
pub trait PolicyCore<K, V>: Sized {
    /// Policy name used in logs and errors.
    const NAME: &'static str;

    /// Whether `delete_expired` does anything and a sweeper is worth starting.
    const SWEEPS: bool = true;

    fn from_options(options: &CacheOptions) -> Result<Self>;

    fn capacity(&self) -> usize;

    fn len(&self) -> usize;

    /// Inserts or updates. Returns every *other* entry unlinked to make room.
    fn put(&mut self, key: K, value: V, expires_at: Option<Instant>, now: Instant) -> Vec<(K, V)>;

    fn get(&mut self, key: &K, now: Instant) -> Lookup<K, V>;

    fn remove(&mut self, key: &K, now: Instant) -> Removal<K, V>;

    fn contains(&self, key: &K, now: Instant) -> bool;

    fn drain_expired(&mut self, now: Instant) -> Vec<(K, V)>;

    /// Empties the core and resets its counters.
    fn drain(&mut self) -> Vec<(K, V)>;

    fn maintenance(&self, _options: &CacheOptions) -> Vec<Maintenance<Self>> {
        Vec::new()
    }
}
