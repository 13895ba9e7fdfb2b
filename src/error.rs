//! Error types for the evictkit library.
//!
//! Only construction can fail. Once a cache exists, misses, expiry and
//! capacity pressure are reported through `Option`/`bool` results.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::builder::{CacheBuilder, CachePolicy};
//! use evictkit::error::CacheError;
//!
//! let err = CacheBuilder::new(0)
//!     .build::<u64, String>(CachePolicy::Lru)
//!     .unwrap_err();
//! assert!(matches!(err, CacheError::InvalidCapacity { .. }));
//!
//! let err = "mru".parse::<CachePolicy>().unwrap_err();
//! assert_eq!(err.to_string(), "unsupported cache policy: mru");
//! ```

use thiserror::Error;

/// Configuration and start-up failures.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A capacity-bounded policy was configured with capacity zero.
    #[error("{policy} cache requires a positive capacity")]
    InvalidCapacity { policy: &'static str },

    /// The policy tag is unknown or reserved.
    #[error("unsupported cache policy: {0}")]
    UnsupportedPolicy(String),

    /// A policy-specific option is out of range.
    #[error("invalid option `{option}`: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: &'static str,
    },

    /// A background thread (sweeper, rebalancer or callback worker) failed to start.
    #[error("failed to spawn background thread")]
    Spawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;
