//! Construction options shared by every policy.
//!
//! `CacheOptions` is a plain record: fill it by hand, start from
//! [`CacheOptions::new`], or go through [`CacheBuilder`](crate::builder::CacheBuilder).
//! Zero durations and pool sizes fall back to the documented defaults when a
//! cache is built; see the `effective_*` accessors.

use std::time::Duration;

use crate::builder::CachePolicy;
use crate::error::{CacheError, Result};

/// Minimum period of the expiry sweeper.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(10);
/// Callback workers started when none are configured.
pub const DEFAULT_WORKER_POOL_CAPACITY: usize = 4;
/// Accesses needed before LRU-K promotes a key.
pub const DEFAULT_LRU_K: usize = 2;
/// LRU-K hotness decay window, also the LRU-MQ epoch length.
pub const DEFAULT_LRU_K_MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(10);
/// Number of LRU-MQ priority levels above level 0.
pub const DEFAULT_MQ_LEVELS: usize = 3;
/// Period of the LRU-MQ level rebalancer.
pub const DEFAULT_MQ_REBALANCE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    pub policy: CachePolicy,
    /// Maximum number of resident entries. Ignored by `Simple`.
    pub capacity: usize,
    /// TTL applied when a put asks for the default lifespan. `None` means never.
    pub default_expiration: Option<Duration>,
    /// Expiry sweep period. Zero disables the sweeper.
    pub sweep_interval: Duration,
    pub worker_pool_capacity: usize,
    pub lru_k: usize,
    pub lru_k_min_update_interval: Duration,
    pub mq_levels: usize,
    pub mq_rebalance_interval: Duration,
}

impl CacheOptions {
    pub fn new(policy: CachePolicy, capacity: usize) -> Self {
        Self {
            policy,
            capacity,
            ..Self::default()
        }
    }

    /// Sweep period after clamping, or `None` when sweeping is disabled.
    pub fn effective_sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval.is_zero() {
            None
        } else {
            Some(self.sweep_interval.max(MIN_SWEEP_INTERVAL))
        }
    }

    pub fn effective_worker_pool_capacity(&self) -> usize {
        if self.worker_pool_capacity == 0 {
            DEFAULT_WORKER_POOL_CAPACITY
        } else {
            self.worker_pool_capacity
        }
    }

    pub fn effective_lru_k_min_update_interval(&self) -> Duration {
        if self.lru_k_min_update_interval.is_zero() {
            DEFAULT_LRU_K_MIN_UPDATE_INTERVAL
        } else {
            self.lru_k_min_update_interval
        }
    }

    pub fn effective_mq_rebalance_interval(&self) -> Duration {
        if self.mq_rebalance_interval.is_zero() {
            DEFAULT_MQ_REBALANCE_INTERVAL
        } else {
            self.mq_rebalance_interval
        }
    }

    /// Rejects a zero capacity for capacity-bounded policies.
    pub(crate) fn require_capacity(&self, policy: &'static str) -> Result<usize> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity { policy });
        }
        Ok(self.capacity)
    }

    pub(crate) fn require_lru_k(&self) -> Result<usize> {
        if self.lru_k == 0 {
            return Err(CacheError::InvalidOption {
                option: "lru_k",
                reason: "must be at least 1",
            });
        }
        Ok(self.lru_k)
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            policy: CachePolicy::Lru,
            capacity: 0,
            default_expiration: None,
            sweep_interval: Duration::ZERO,
            worker_pool_capacity: DEFAULT_WORKER_POOL_CAPACITY,
            lru_k: DEFAULT_LRU_K,
            lru_k_min_update_interval: DEFAULT_LRU_K_MIN_UPDATE_INTERVAL,
            mq_levels: DEFAULT_MQ_LEVELS,
            mq_rebalance_interval: DEFAULT_MQ_REBALANCE_INTERVAL,
        }
    }
}
