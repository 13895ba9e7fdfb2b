// ==============================================
// CROSS-POLICY CONTRACT TESTS (integration)
// ==============================================
//
// Behaviour every policy shares through the `CoreCache` / `ExpireCache`
// traits, driven through the `Cache` facade so each case runs against all
// six policies.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use evictkit::prelude::*;
use parking_lot::Mutex;

const POLICIES: [CachePolicy; 6] = [
    CachePolicy::Simple,
    CachePolicy::Lru,
    CachePolicy::Lfu,
    CachePolicy::LruK,
    CachePolicy::TwoQueue,
    CachePolicy::LruMq,
];

/// LRU-K (k = 2) and 2Q only make a key readable on its second put.
fn put_resident<C: ExpireCache<u32, String>>(cache: &C, key: u32, value: &str, ttl: Lifespan) {
    cache.put_with_expire(key, value.to_string(), ttl);
    cache.put_with_expire(key, value.to_string(), ttl);
}

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    done()
}

type Seen = Arc<Mutex<Vec<(u32, String)>>>;

fn recording_cache(policy: CachePolicy, capacity: usize) -> (Cache<u32, String>, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let cache = CacheBuilder::new(capacity)
        .worker_pool_capacity(2)
        .build_with_callback(policy, move |k: u32, v: String| sink.lock().push((k, v)))
        .unwrap();
    (cache, seen)
}

// ==============================================
// Capacity-0 Construction
// ==============================================

mod zero_capacity {
    use super::*;

    #[test]
    fn bounded_policies_reject_zero() {
        for policy in POLICIES.into_iter().filter(|p| *p != CachePolicy::Simple) {
            let err = CacheBuilder::new(0).build::<u32, String>(policy).unwrap_err();
            assert!(
                matches!(err, CacheError::InvalidCapacity { .. }),
                "{policy} accepted capacity 0"
            );
        }
    }

    #[test]
    fn simple_accepts_zero_and_stores_anyway() {
        let cache = CacheBuilder::new(0).build::<u32, String>(CachePolicy::Simple).unwrap();
        for k in 0..10 {
            assert!(!cache.put(k, k.to_string()));
        }
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn options_record_reaches_the_same_checks() {
        let options = CacheOptions::new(CachePolicy::Lfu, 0);
        assert!(Cache::<u32, String>::from_options(&options, None).is_err());

        let options = CacheOptions::new(CachePolicy::Arc, 8);
        assert!(matches!(
            Cache::<u32, String>::from_options(&options, None),
            Err(CacheError::UnsupportedPolicy(_))
        ));
    }
}

// ==============================================
// Expiration
// ==============================================

mod expiration {
    use super::*;

    #[test]
    fn ttl_entries_expire_lazily_and_shrink_len() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(8).build::<u32, String>(policy).unwrap();
            put_resident(&cache, 1, "short", Lifespan::After(Duration::from_millis(50)));
            put_resident(&cache, 2, "long", Lifespan::Never);
            assert_eq!(cache.get(&1), Some("short".to_string()), "{policy}");

            thread::sleep(Duration::from_millis(80));
            assert!(!cache.contains(&1), "{policy}");
            assert_eq!(cache.len(), 2, "{policy}: unswept entries still count");
            assert_eq!(cache.get(&1), None, "{policy}");
            assert_eq!(cache.len(), 1, "{policy}");
            assert_eq!(cache.get(&2), Some("long".to_string()), "{policy}");
        }
    }

    #[test]
    fn update_switches_never_to_expiring() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(8).build::<u32, String>(policy).unwrap();
            put_resident(&cache, 1, "v1", Lifespan::Never);
            put_resident(&cache, 1, "v2", Lifespan::After(Duration::from_millis(20)));
            assert_eq!(cache.get(&1), Some("v2".to_string()), "{policy}");
            thread::sleep(Duration::from_millis(50));
            assert_eq!(cache.get(&1), None, "{policy}");
        }
    }

    #[test]
    fn update_switches_expiring_to_never() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(8).build::<u32, String>(policy).unwrap();
            put_resident(&cache, 1, "v1", Lifespan::After(Duration::from_millis(20)));
            put_resident(&cache, 1, "v2", Lifespan::Never);
            thread::sleep(Duration::from_millis(50));
            assert_eq!(cache.get(&1), Some("v2".to_string()), "{policy}");
        }
    }

    #[test]
    fn delete_expired_fires_callbacks_for_sweeping_policies() {
        for policy in POLICIES.into_iter().filter(|p| *p != CachePolicy::LruMq) {
            let (cache, seen) = recording_cache(policy, 8);
            put_resident(&cache, 1, "gone", Lifespan::After(Duration::from_millis(10)));
            put_resident(&cache, 2, "kept", Lifespan::Never);
            thread::sleep(Duration::from_millis(30));

            cache.delete_expired();
            assert_eq!(cache.len(), 1, "{policy}");
            assert!(wait_until(Duration::from_secs(2), || !seen.lock().is_empty()));
            assert_eq!(*seen.lock(), vec![(1, "gone".to_string())], "{policy}");
        }
    }

    #[test]
    fn lru_mq_expiry_is_lazy_only() {
        let cache = CacheBuilder::new(8).build::<u32, String>(CachePolicy::LruMq).unwrap();
        cache.put_with_expire(1, "v".to_string(), Lifespan::After(Duration::from_millis(10)));
        thread::sleep(Duration::from_millis(30));
        cache.delete_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn remove_of_expired_entry_reports_false() {
        for policy in POLICIES {
            let (cache, seen) = recording_cache(policy, 8);
            put_resident(&cache, 1, "v", Lifespan::After(Duration::from_millis(10)));
            thread::sleep(Duration::from_millis(30));
            assert!(!cache.remove(&1), "{policy}");
            assert_eq!(cache.len(), 0, "{policy}");
            assert!(wait_until(Duration::from_secs(2), || seen.lock().len() == 1));
        }
    }
}

// ==============================================
// Callbacks and Clear
// ==============================================

mod callbacks {
    use super::*;

    #[test]
    fn clear_fires_once_per_entry_before_returning() {
        for policy in POLICIES {
            let (cache, seen) = recording_cache(policy, 8);
            for k in 0..5 {
                put_resident(&cache, k, "v", Lifespan::Never);
            }
            cache.clear();
            let mut keys: Vec<u32> = seen.lock().iter().map(|(k, _)| *k).collect();
            keys.sort_unstable();
            assert_eq!(keys, vec![0, 1, 2, 3, 4], "{policy}");

            cache.clear();
            assert_eq!(seen.lock().len(), 5, "{policy}: second clear is a no-op");
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn capacity_eviction_reports_true_and_notifies() {
        for policy in POLICIES.into_iter().filter(|p| *p != CachePolicy::Simple) {
            let (cache, seen) = recording_cache(policy, 2);
            put_resident(&cache, 1, "a", Lifespan::Never);
            put_resident(&cache, 2, "b", Lifespan::Never);

            // Whichever of the two puts admits key 3 is the one that evicts.
            let first = cache.put(3, "c".to_string());
            let second = cache.put(3, "c".to_string());
            assert!(first != second, "{policy}: exactly one put should evict");
            assert_eq!(cache.len(), 2, "{policy}");
            assert!(wait_until(Duration::from_secs(2), || seen.lock().len() == 1), "{policy}");
            assert!(cache.contains(&3), "{policy}");
        }
    }

    #[test]
    fn panicking_callback_does_not_poison_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let cache = CacheBuilder::new(1)
            .worker_pool_capacity(1)
            .build_with_callback(CachePolicy::Lru, move |k: u32, _v: u32| {
                c.fetch_add(1, Ordering::SeqCst);
                if k == 1 {
                    panic!("callback failure");
                }
            })
            .unwrap();

        cache.put(1, 1);
        cache.put(2, 2);
        cache.put(3, 3);
        assert!(wait_until(Duration::from_secs(2), || calls.load(Ordering::SeqCst) == 2));
        assert_eq!(cache.get(&3), Some(3));
    }
}

// ==============================================
// Policy-Specific Ordering
// ==============================================

mod ordering {
    use super::*;

    #[test]
    fn lru_evicts_least_recently_used() {
        let cache = CacheBuilder::new(2).build::<u32, String>(CachePolicy::Lru).unwrap();
        cache.put(1, "a".into());
        cache.put(2, "b".into());
        cache.get(&1);
        assert!(cache.put(3, "c".into()));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&1));
    }

    #[test]
    fn lfu_evicts_minimum_frequency() {
        let cache: LfuCache<u32, &str> = LfuCache::new(3).unwrap();
        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c");
        cache.get(&1);
        cache.get(&1);
        cache.get(&2);
        assert!(cache.put(4, "d"));
        assert!(!cache.contains(&3));
        assert_eq!(cache.frequency(&1), Some(3));
    }

    #[test]
    fn two_queue_needs_second_put() {
        let cache = CacheBuilder::new(4).build::<u32, String>(CachePolicy::TwoQueue).unwrap();
        assert!(!cache.put(1, "a".into()));
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.len(), 0);
        cache.put(1, "a".into());
        assert_eq!(cache.get(&1), Some("a".into()));
    }

    #[test]
    fn lru_k_respects_configured_k() {
        let cache = CacheBuilder::new(4)
            .lru_k(3)
            .build::<u32, String>(CachePolicy::LruK)
            .unwrap();
        cache.put(1, "a".into());
        cache.put(1, "a".into());
        assert_eq!(cache.get(&1), None);
        cache.put(1, "a".into());
        assert_eq!(cache.get(&1), Some("a".into()));
    }
}
