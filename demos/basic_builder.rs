use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use evictkit::prelude::*;

fn main() -> Result<(), CacheError> {
    let policy: CachePolicy = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "lfu".to_string())
        .parse()?;

    let evictions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&evictions);
    let cache = CacheBuilder::new(3)
        .default_expiration(Duration::from_millis(100))
        .build_with_callback(policy, move |key: &'static str, value: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            println!("  callback: {key} = {value}");
        })?;

    println!("policy: {}", cache.policy());

    for (key, value) in [("a", 1), ("b", 2), ("c", 3)] {
        // 2Q and LRU-K only admit a key on its second put.
        cache.put(key, value);
        cache.put(key, value);
    }
    cache.get(&"a");
    cache.get(&"a");

    cache.put_with_expire("d", 4, Lifespan::Default);
    cache.put_with_expire("d", 4, Lifespan::Default);
    println!("len after d: {}", cache.len());

    thread::sleep(Duration::from_millis(150));
    println!("d after its ttl: {:?}", cache.get(&"d"));

    cache.clear();
    thread::sleep(Duration::from_millis(20));
    println!("callbacks fired: {}", evictions.load(Ordering::SeqCst));
    Ok(())
}

// Run with: cargo run --example basic_builder -- lru-2q
//
// Every entry that leaves the cache (evicted, expired or cleared) passes
// through the callback exactly once.
