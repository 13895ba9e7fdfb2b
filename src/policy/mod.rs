//! Eviction policies and the thread-safe wrapper they share.
//!
//! Each policy is a single-threaded core implementing
//! [`PolicyCore`](crate::traits::PolicyCore). [`ConcurrentCache`] puts one
//! `parking_lot::RwLock` around a core and adds everything that is the same
//! for every policy: TTL resolution, eviction callbacks, the expiry sweeper
//! and any periodic maintenance the core asks for.
//!
//! ```text
//!   ConcurrentCache<C, K, V>
//!   ├── sweeper:     Option<Watchdog> ──┐ weak
//!   ├── maintenance: Vec<Watchdog> ─────┤ weak
//!   └── shared: Arc<Shared> ◄───────────┘
//!         ├── core:     RwLock<C>
//!         ├── notifier: Notifier<K, V>  (callback + worker pool)
//!         └── default_ttl
//! ```
//!
//! Lock discipline: `put`, `get`, `remove`, `clear` and the sweep take the
//! write lock (a read reorders recency or frequency state); `len`,
//! `contains` and `capacity` take the read lock. Callbacks always run after
//! the lock is released.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::callback::{EvictCallback, Notifier};
use crate::config::CacheOptions;
use crate::error::Result;
use crate::expire::{Lifespan, Watchdog};
use crate::traits::{CoreCache, ExpireCache, Lookup, PolicyCore, Removal};

pub mod lfu;
pub mod lru;
pub mod lru_k;
pub mod lru_mq;
pub mod simple;
pub mod two_q;

struct Shared<C, K, V> {
    core: RwLock<C>,
    notifier: Notifier<K, V>,
    default_ttl: Option<Duration>,
}

impl<C, K, V> Shared<C, K, V>
where
    C: PolicyCore<K, V>,
    K: Send + 'static,
    V: Send + 'static,
{
    fn delete_expired(&self) {
        let expired = self.core.write().drain_expired(Instant::now());
        if !expired.is_empty() {
            debug!(policy = C::NAME, count = expired.len(), "removed expired entries");
        }
        self.notifier.dispatch(expired);
    }
}

/// A policy core behind one lock, with callbacks and background upkeep.
///
/// Use the per-policy aliases ([`LruCache`](lru::LruCache),
/// [`LfuCache`](lfu::LfuCache), ...) or the [`Cache`](crate::builder::Cache)
/// facade rather than naming this type directly.
pub struct ConcurrentCache<C, K, V> {
    sweeper: Option<Watchdog>,
    maintenance: Vec<Watchdog>,
    shared: Arc<Shared<C, K, V>>,
}

impl<C, K, V> ConcurrentCache<C, K, V>
where
    C: PolicyCore<K, V> + Send + Sync + 'static,
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a cache with default options and no callback.
    pub fn new(capacity: usize) -> Result<Self> {
        let options = CacheOptions {
            capacity,
            ..CacheOptions::default()
        };
        Self::with_options(&options, None)
    }

    pub fn with_callback(capacity: usize, callback: EvictCallback<K, V>) -> Result<Self> {
        let options = CacheOptions {
            capacity,
            ..CacheOptions::default()
        };
        Self::with_options(&options, Some(callback))
    }

    /// Builds the core from `options` and starts the background threads it needs.
    ///
    /// `options.policy` is not consulted; the core type decides the policy.
    pub fn with_options(
        options: &CacheOptions,
        callback: Option<EvictCallback<K, V>>,
    ) -> Result<Self> {
        let core = C::from_options(options)?;
        let tasks = core.maintenance(options);
        let capacity = core.capacity();
        let notifier = Notifier::new(callback, options.effective_worker_pool_capacity())?;
        let shared = Arc::new(Shared {
            core: RwLock::new(core),
            notifier,
            default_ttl: options.default_expiration,
        });

        let sweep_interval = if C::SWEEPS {
            options.effective_sweep_interval()
        } else {
            None
        };
        let sweeper = match sweep_interval {
            Some(interval) => Some(Watchdog::spawn(
                &format!("evictkit-sweep-{}", C::NAME),
                interval,
                Arc::downgrade(&shared),
                |shared: &Shared<C, K, V>| shared.delete_expired(),
            )?),
            None => None,
        };

        let maintenance = tasks
            .into_iter()
            .map(|task| {
                let job = task.job;
                Watchdog::spawn(
                    task.name,
                    task.interval,
                    Arc::downgrade(&shared),
                    move |shared: &Shared<C, K, V>| job(&mut *shared.core.write()),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            policy = C::NAME,
            capacity,
            callback = shared.notifier.is_enabled(),
            workers = shared.notifier.pool_size(),
            sweep_interval = ?sweeper.as_ref().map(Watchdog::interval),
            "cache created"
        );

        Ok(Self {
            sweeper,
            maintenance,
            shared,
        })
    }

    /// Period of the expiry sweeper, or `None` when it is not running.
    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweeper
            .as_ref()
            .filter(|dog| dog.is_running())
            .map(Watchdog::interval)
    }

    /// Stops every background thread. Reads and writes keep working; only
    /// lazy expiration remains. Calling it again does nothing.
    pub fn close(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
        for task in &self.maintenance {
            task.stop();
        }
    }

    /// Runs `f` against the core under the read lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&*self.shared.core.read())
    }

    #[cfg(test)]
    pub(crate) fn inspect_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut *self.shared.core.write())
    }
}

impl<C, K, V> CoreCache<K, V> for ConcurrentCache<C, K, V>
where
    C: PolicyCore<K, V> + Send + Sync + 'static,
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn put(&self, key: K, value: V) -> bool {
        self.put_with_expire(key, value, Lifespan::Never)
    }

    fn get(&self, key: &K) -> Option<V> {
        let lookup = self.shared.core.write().get(key, Instant::now());
        match lookup {
            Lookup::Hit(value) => Some(value),
            Lookup::Expired(key, value) => {
                self.shared.notifier.dispatch(vec![(key, value)]);
                None
            },
            Lookup::Miss => None,
        }
    }

    fn remove(&self, key: &K) -> bool {
        let removal = self.shared.core.write().remove(key, Instant::now());
        let live = matches!(removal, Removal::Removed(..));
        if let Some(entry) = removal.into_entry() {
            self.shared.notifier.dispatch(vec![entry]);
        }
        live
    }

    fn contains(&self, key: &K) -> bool {
        self.shared.core.read().contains(key, Instant::now())
    }

    fn len(&self) -> usize {
        self.shared.core.read().len()
    }

    fn capacity(&self) -> usize {
        self.shared.core.read().capacity()
    }

    fn clear(&self) {
        let drained = self.shared.core.write().drain();
        debug!(policy = C::NAME, count = drained.len(), "cache cleared");
        self.shared.notifier.run_inline(drained);
    }
}

impl<C, K, V> ExpireCache<K, V> for ConcurrentCache<C, K, V>
where
    C: PolicyCore<K, V> + Send + Sync + 'static,
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn put_with_expire(&self, key: K, value: V, ttl: Lifespan) -> bool {
        let now = Instant::now();
        let expires_at = ttl.deadline(self.shared.default_ttl, now);
        let evicted = self.shared.core.write().put(key, value, expires_at, now);
        if evicted.is_empty() {
            return false;
        }
        trace!(policy = C::NAME, count = evicted.len(), "evicted for capacity");
        self.shared.notifier.dispatch(evicted);
        true
    }

    fn delete_expired(&self) {
        self.shared.delete_expired();
    }
}

impl<C, K, V> Drop for ConcurrentCache<C, K, V> {
    fn drop(&mut self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
        for task in &self.maintenance {
            task.stop();
        }
    }
}

impl<C, K, V> fmt::Debug for ConcurrentCache<C, K, V>
where
    C: PolicyCore<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.core.read();
        f.debug_struct("ConcurrentCache")
            .field("policy", &C::NAME)
            .field("len", &core.len())
            .field("capacity", &core.capacity())
            .field("sweeper", &self.sweeper)
            .finish_non_exhaustive()
    }
}
