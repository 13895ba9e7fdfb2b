//! evictkit: thread-safe in-process key/value caches with pluggable
//! eviction policies, per-entry expiry and eviction callbacks.
//!
//! Every policy (Simple, LRU, LFU, 2Q, LRU-K, LRU-MQ) exposes the same
//! [`CoreCache`](traits::CoreCache) / [`ExpireCache`](traits::ExpireCache)
//! contract. Use a concrete alias such as [`LruCache`](policy::lru::LruCache)
//! when the policy is fixed, or [`CacheBuilder`](builder::CacheBuilder) to
//! pick one at runtime.
//!
//! ```
//! use evictkit::prelude::*;
//!
//! let cache = CacheBuilder::new(2).build::<&str, u32>(CachePolicy::Lru).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get(&"a");
//! assert!(cache.put("c", 3));
//! assert!(!cache.contains(&"b"));
//! ```

pub mod builder;
pub mod callback;
pub mod config;
pub mod ds;
pub mod entry;
pub mod error;
pub mod expire;
pub mod policy;
pub mod prelude;
pub mod traits;
