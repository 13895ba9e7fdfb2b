//! Time-based expiration.
//!
//! Entries hold an absolute deadline computed once, at put time, from a
//! [`Lifespan`]. Caches check it lazily on every read and, when a sweep
//! interval is configured, a [`Watchdog`] removes expired entries in the
//! background.

use std::time::{Duration, Instant};

pub mod watchdog;

pub use watchdog::Watchdog;

/// How long a put should keep its value readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifespan {
    /// No expiry, regardless of the cache default.
    Never,
    /// The cache's configured default expiration (never if none is set).
    #[default]
    Default,
    /// Expire this long after the put. A zero duration behaves like
    /// [`Lifespan::Default`].
    After(Duration),
}

impl Lifespan {
    /// Absolute deadline for a put made at `now`.
    pub fn deadline(self, default: Option<Duration>, now: Instant) -> Option<Instant> {
        let ttl = match self {
            Lifespan::Never => return None,
            Lifespan::After(ttl) if !ttl.is_zero() => ttl,
            Lifespan::Default | Lifespan::After(_) => default?,
        };
        if ttl.is_zero() {
            return None;
        }
        now.checked_add(ttl)
    }
}

/// Zero means "use the default"; anything else is an explicit TTL.
impl From<Duration> for Lifespan {
    fn from(ttl: Duration) -> Self {
        if ttl.is_zero() {
            Lifespan::Default
        } else {
            Lifespan::After(ttl)
        }
    }
}

impl From<Option<Duration>> for Lifespan {
    fn from(ttl: Option<Duration>) -> Self {
        ttl.map_or(Lifespan::Never, Lifespan::from)
    }
}
