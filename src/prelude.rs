pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::callback::EvictCallback;
pub use crate::config::CacheOptions;
pub use crate::error::CacheError;
pub use crate::expire::Lifespan;
pub use crate::policy::ConcurrentCache;
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::lru::LruCache;
pub use crate::policy::lru_k::LrukCache;
pub use crate::policy::lru_mq::LruMqCache;
pub use crate::policy::simple::SimpleCache;
pub use crate::policy::two_q::TwoQCache;
pub use crate::traits::{CoreCache, ExpireCache};
