//! Unified cache factory for all eviction policies.
//!
//! Pick a policy at runtime (from a config string, say) and get back one
//! [`Cache`] type that behaves the same whatever is behind it.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use evictkit::builder::{CacheBuilder, CachePolicy};
//! use evictkit::traits::CoreCache;
//!
//! let policy: CachePolicy = "lfu".parse().unwrap();
//! let cache = CacheBuilder::new(100)
//!     .default_expiration(Duration::from_secs(60))
//!     .build::<u64, String>(policy)
//!     .unwrap();
//! cache.put(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some("hello".to_string()));
//! ```

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::callback::EvictCallback;
use crate::config::CacheOptions;
use crate::error::{CacheError, Result};
use crate::expire::Lifespan;
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::policy::lru_k::LrukCache;
use crate::policy::lru_mq::LruMqCache;
use crate::policy::simple::SimpleCache;
use crate::policy::two_q::TwoQCache;
use crate::traits::{CoreCache, ExpireCache};

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Unbounded map with per-entry expiry.
    Simple,
    /// Least Recently Used eviction.
    Lru,
    /// Least Frequently Used eviction.
    Lfu,
    /// LRU gated by an access history; see `CacheOptions::lru_k`.
    LruK,
    /// LRU behind a one-put admission queue.
    TwoQueue,
    /// Multi-level LRU with epoch aging.
    LruMq,
    /// Reserved. Building it fails with [`CacheError::UnsupportedPolicy`].
    Arc,
}

impl CachePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            CachePolicy::Simple => "simple",
            CachePolicy::Lru => "lru",
            CachePolicy::Lfu => "lfu",
            CachePolicy::LruK => "lru-k",
            CachePolicy::TwoQueue => "lru-2q",
            CachePolicy::LruMq => "lru-mq",
            CachePolicy::Arc => "arc",
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CachePolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(CachePolicy::Simple),
            "lru" => Ok(CachePolicy::Lru),
            "lfu" => Ok(CachePolicy::Lfu),
            "lru-k" => Ok(CachePolicy::LruK),
            "lru-2q" | "2q" => Ok(CachePolicy::TwoQueue),
            "lru-mq" => Ok(CachePolicy::LruMq),
            "arc" => Ok(CachePolicy::Arc),
            _ => Err(CacheError::UnsupportedPolicy(s.to_string())),
        }
    }
}

/// Unified cache wrapper that provides a consistent API regardless of policy.
///
/// Cheap to share: wrap it in an `Arc` and call it from any thread.
pub struct Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: CacheInner<K, V>,
}

enum CacheInner<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Simple(SimpleCache<K, V>),
    Lru(LruCache<K, V>),
    Lfu(LfuCache<K, V>),
    LruK(LrukCache<K, V>),
    TwoQueue(TwoQCache<K, V>),
    LruMq(LruMqCache<K, V>),
}

/// Runs the same expression against whichever policy is inside.
macro_rules! with_inner {
    ($inner:expr, $cache:ident => $body:expr) => {
        match $inner {
            CacheInner::Simple($cache) => $body,
            CacheInner::Lru($cache) => $body,
            CacheInner::Lfu($cache) => $body,
            CacheInner::LruK($cache) => $body,
            CacheInner::TwoQueue($cache) => $body,
            CacheInner::LruMq($cache) => $body,
        }
    };
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Builds the cache `options.policy` names.
    pub fn from_options(
        options: &CacheOptions,
        callback: Option<EvictCallback<K, V>>,
    ) -> Result<Self> {
        let inner = match options.policy {
            CachePolicy::Simple => CacheInner::Simple(SimpleCache::with_options(options, callback)?),
            CachePolicy::Lru => CacheInner::Lru(LruCache::with_options(options, callback)?),
            CachePolicy::Lfu => CacheInner::Lfu(LfuCache::with_options(options, callback)?),
            CachePolicy::LruK => CacheInner::LruK(LrukCache::with_options(options, callback)?),
            CachePolicy::TwoQueue => {
                CacheInner::TwoQueue(TwoQCache::with_options(options, callback)?)
            },
            CachePolicy::LruMq => CacheInner::LruMq(LruMqCache::with_options(options, callback)?),
            CachePolicy::Arc => {
                return Err(CacheError::UnsupportedPolicy(CachePolicy::Arc.to_string()));
            },
        };
        Ok(Self { inner })
    }

    pub fn policy(&self) -> CachePolicy {
        match &self.inner {
            CacheInner::Simple(_) => CachePolicy::Simple,
            CacheInner::Lru(_) => CachePolicy::Lru,
            CacheInner::Lfu(_) => CachePolicy::Lfu,
            CacheInner::LruK(_) => CachePolicy::LruK,
            CacheInner::TwoQueue(_) => CachePolicy::TwoQueue,
            CacheInner::LruMq(_) => CachePolicy::LruMq,
        }
    }

    /// Period of the expiry sweeper, or `None` when it is not running.
    pub fn sweep_interval(&self) -> Option<Duration> {
        with_inner!(&self.inner, cache => cache.sweep_interval())
    }

    /// Stops background threads. Idempotent.
    pub fn close(&self) {
        with_inner!(&self.inner, cache => cache.close())
    }
}

impl<K, V> CoreCache<K, V> for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn put(&self, key: K, value: V) -> bool {
        with_inner!(&self.inner, cache => cache.put(key, value))
    }

    fn get(&self, key: &K) -> Option<V> {
        with_inner!(&self.inner, cache => cache.get(key))
    }

    fn remove(&self, key: &K) -> bool {
        with_inner!(&self.inner, cache => cache.remove(key))
    }

    fn contains(&self, key: &K) -> bool {
        with_inner!(&self.inner, cache => cache.contains(key))
    }

    fn len(&self) -> usize {
        with_inner!(&self.inner, cache => cache.len())
    }

    fn capacity(&self) -> usize {
        with_inner!(&self.inner, cache => cache.capacity())
    }

    fn clear(&self) {
        with_inner!(&self.inner, cache => cache.clear())
    }
}

impl<K, V> ExpireCache<K, V> for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn put_with_expire(&self, key: K, value: V, ttl: Lifespan) -> bool {
        with_inner!(&self.inner, cache => cache.put_with_expire(key, value, ttl))
    }

    fn delete_expired(&self) {
        with_inner!(&self.inner, cache => cache.delete_expired())
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("policy", &self.policy())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    options: CacheOptions,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            options: CacheOptions {
                capacity,
                ..CacheOptions::default()
            },
        }
    }

    /// TTL used by `put` calls that ask for [`Lifespan::Default`].
    pub fn default_expiration(mut self, ttl: Duration) -> Self {
        self.options.default_expiration = (!ttl.is_zero()).then_some(ttl);
        self
    }

    /// Starts an expiry sweeper with this period (at least 10 s).
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.options.sweep_interval = interval;
        self
    }

    pub fn worker_pool_capacity(mut self, workers: usize) -> Self {
        self.options.worker_pool_capacity = workers;
        self
    }

    pub fn lru_k(mut self, k: usize) -> Self {
        self.options.lru_k = k;
        self
    }

    pub fn lru_k_min_update_interval(mut self, interval: Duration) -> Self {
        self.options.lru_k_min_update_interval = interval;
        self
    }

    pub fn mq_levels(mut self, levels: usize) -> Self {
        self.options.mq_levels = levels;
        self
    }

    pub fn mq_rebalance_interval(mut self, interval: Duration) -> Self {
        self.options.mq_rebalance_interval = interval;
        self
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Build a cache with the specified policy.
    ///
    /// # Example
    ///
    /// ```rust
    /// use evictkit::builder::{CacheBuilder, CachePolicy};
    ///
    /// let lru = CacheBuilder::new(100).build::<u64, String>(CachePolicy::Lru).unwrap();
    ///
    /// // LRU-K with K=3
    /// let lruk = CacheBuilder::new(100)
    ///     .lru_k(3)
    ///     .build::<u64, String>(CachePolicy::LruK)
    ///     .unwrap();
    ///
    /// assert!(CacheBuilder::new(100).build::<u64, String>(CachePolicy::Arc).is_err());
    /// ```
    pub fn build<K, V>(self, policy: CachePolicy) -> Result<Cache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        self.build_inner(policy, None)
    }

    /// Like [`build`](Self::build), with a callback for every entry that leaves the cache.
    pub fn build_with_callback<K, V, F>(self, policy: CachePolicy, callback: F) -> Result<Cache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        F: Fn(K, V) + Send + Sync + 'static,
    {
        self.build_inner(policy, Some(Arc::new(callback)))
    }

    fn build_inner<K, V>(
        self,
        policy: CachePolicy,
        callback: Option<EvictCallback<K, V>>,
    ) -> Result<Cache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let options = CacheOptions {
            policy,
            ..self.options
        };
        Cache::from_options(&options, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const POLICIES: [CachePolicy; 6] = [
        CachePolicy::Simple,
        CachePolicy::Lru,
        CachePolicy::Lfu,
        CachePolicy::LruK,
        CachePolicy::TwoQueue,
        CachePolicy::LruMq,
    ];

    /// LRU-K and 2Q only admit a key on its second put.
    fn admit(cache: &Cache<u64, String>, key: u64, value: &str) {
        cache.put(key, value.to_string());
        cache.put(key, value.to_string());
    }

    mod parsing {
        use super::*;

        #[test]
        fn test_parses_every_tag_case_insensitively() {
            let cases = [
                ("simple", CachePolicy::Simple),
                ("LRU", CachePolicy::Lru),
                ("Lfu", CachePolicy::Lfu),
                ("lru-k", CachePolicy::LruK),
                ("lru-2q", CachePolicy::TwoQueue),
                ("2Q", CachePolicy::TwoQueue),
                ("lru-mq", CachePolicy::LruMq),
                ("ARC", CachePolicy::Arc),
            ];
            for (tag, policy) in cases {
                assert_eq!(tag.parse::<CachePolicy>().unwrap(), policy, "{tag}");
            }
        }

        #[test]
        fn test_unknown_tag_is_unsupported() {
            let err = "clock".parse::<CachePolicy>().unwrap_err();
            assert!(matches!(err, CacheError::UnsupportedPolicy(ref s) if s == "clock"));
        }

        #[test]
        fn test_display_round_trips_through_from_str() {
            for policy in POLICIES {
                assert_eq!(policy.to_string().parse::<CachePolicy>().unwrap(), policy);
            }
        }
    }

    mod construction {
        use super::*;

        #[test]
        fn test_all_policies_basic_ops() {
            for policy in POLICIES {
                let cache = CacheBuilder::new(10).build::<u64, String>(policy).unwrap();
                assert_eq!(cache.policy(), policy);

                admit(&cache, 1, "one");
                admit(&cache, 2, "two");
                assert_eq!(cache.get(&1), Some("one".to_string()), "{policy}");
                assert_eq!(cache.get(&3), None);
                assert!(cache.contains(&2));
                assert_eq!(cache.len(), 2);
                assert_eq!(cache.capacity(), 10);

                admit(&cache, 1, "ONE");
                assert_eq!(cache.get(&1), Some("ONE".to_string()), "{policy}");

                assert!(cache.remove(&2));
                assert!(!cache.remove(&2));

                cache.clear();
                assert!(cache.is_empty());
                cache.close();
            }
        }

        #[test]
        fn test_zero_capacity_only_allowed_for_simple() {
            for policy in POLICIES {
                let built = CacheBuilder::new(0).build::<u64, String>(policy);
                if policy == CachePolicy::Simple {
                    assert!(built.is_ok());
                } else {
                    assert!(
                        matches!(built, Err(CacheError::InvalidCapacity { .. })),
                        "{policy}"
                    );
                }
            }
        }

        #[test]
        fn test_arc_is_reserved() {
            let err = CacheBuilder::new(8).build::<u64, String>(CachePolicy::Arc).unwrap_err();
            assert_eq!(err.to_string(), "unsupported cache policy: arc");
        }

        #[test]
        fn test_lru_k_zero_rejected() {
            for policy in [CachePolicy::LruK, CachePolicy::LruMq] {
                let built = CacheBuilder::new(8).lru_k(0).build::<u64, String>(policy);
                assert!(matches!(built, Err(CacheError::InvalidOption { option: "lru_k", .. })));
            }
        }

        #[test]
        fn test_setters_fill_options() {
            let builder = CacheBuilder::new(16)
                .default_expiration(Duration::from_secs(5))
                .sweep_interval(Duration::from_secs(20))
                .worker_pool_capacity(2)
                .lru_k(3)
                .lru_k_min_update_interval(Duration::from_secs(1))
                .mq_levels(5)
                .mq_rebalance_interval(Duration::from_millis(50));
            let opts = builder.options();
            assert_eq!(opts.capacity, 16);
            assert_eq!(opts.default_expiration, Some(Duration::from_secs(5)));
            assert_eq!(opts.sweep_interval, Duration::from_secs(20));
            assert_eq!(opts.worker_pool_capacity, 2);
            assert_eq!(opts.lru_k, 3);
            assert_eq!(opts.lru_k_min_update_interval, Duration::from_secs(1));
            assert_eq!(opts.mq_levels, 5);
            assert_eq!(opts.mq_rebalance_interval, Duration::from_millis(50));

            let none = CacheBuilder::new(1).default_expiration(Duration::ZERO);
            assert_eq!(none.options().default_expiration, None);
        }

        #[test]
        fn test_sweeper_interval_is_clamped_and_stoppable() {
            let cache = CacheBuilder::new(8)
                .sweep_interval(Duration::from_millis(5))
                .build::<u64, String>(CachePolicy::Lru)
                .unwrap();
            assert_eq!(cache.sweep_interval(), Some(Duration::from_secs(10)));
            cache.close();
            assert_eq!(cache.sweep_interval(), None);
            cache.close();

            let lazy = CacheBuilder::new(8).build::<u64, String>(CachePolicy::Lfu).unwrap();
            assert_eq!(lazy.sweep_interval(), None);
        }
    }

    mod behavior {
        use super::*;

        #[test]
        fn test_capacity_enforcement() {
            let cache = CacheBuilder::new(2).build::<u64, String>(CachePolicy::Lru).unwrap();
            assert!(!cache.put(1, "one".to_string()));
            assert!(!cache.put(2, "two".to_string()));
            assert!(cache.put(3, "three".to_string()));

            assert_eq!(cache.len(), 2);
            assert!(!cache.contains(&1));
            assert!(cache.contains(&2));
            assert!(cache.contains(&3));
        }

        #[test]
        fn test_default_expiration_applies_to_default_lifespan_only() {
            let cache = CacheBuilder::new(8)
                .default_expiration(Duration::from_millis(10))
                .build::<u64, String>(CachePolicy::Lru)
                .unwrap();
            cache.put_with_expire(1, "default".to_string(), Lifespan::Default);
            cache.put(2, "forever".to_string());
            std::thread::sleep(Duration::from_millis(30));
            assert_eq!(cache.get(&1), None);
            assert_eq!(cache.get(&2), Some("forever".to_string()));
        }

        #[test]
        fn test_callback_sees_capacity_eviction() {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let count = Arc::new(AtomicUsize::new(0));
            let (s, c) = (Arc::clone(&seen), Arc::clone(&count));
            let cache = CacheBuilder::new(1)
                .worker_pool_capacity(1)
                .build_with_callback(CachePolicy::Lru, move |k: u64, v: String| {
                    s.lock().push((k, v));
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();

            cache.put(1, "one".to_string());
            assert!(cache.put(2, "two".to_string()));

            let start = Instant::now();
            while count.load(Ordering::SeqCst) < 1 && start.elapsed() < Duration::from_secs(2) {
                std::thread::sleep(Duration::from_millis(1));
            }
            assert_eq!(*seen.lock(), vec![(1, "one".to_string())]);
        }

        #[test]
        fn test_debug_names_policy() {
            let cache = CacheBuilder::new(4).build::<u64, String>(CachePolicy::TwoQueue).unwrap();
            let text = format!("{cache:?}");
            assert!(text.contains("TwoQueue"));
        }
    }
}
