//! Stored units shared by the policy cores.
//!
//! An [`Item`] is a value plus its absolute expiry. Policy cores wrap it in
//! their own per-entry records (`HistoryEntry`, `MqEntry`) and
//! keep the key next to it in an [`Entry`] so eviction can hand both back.

use std::time::{Duration, Instant};

/// Anything that may carry an absolute expiry.
pub trait Expirable {
    fn expires_at(&self) -> Option<Instant>;

    /// `true` once `now` is strictly past the expiry. Never-expiring values
    /// are never expired.
    #[inline]
    fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at() {
            Some(deadline) => now > deadline,
            None => false,
        }
    }
}

/// A cached value and when it stops being readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item<V> {
    pub value: V,
    pub expires_at: Option<Instant>,
}

impl<V> Item<V> {
    pub fn new(value: V, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    pub fn never_expiring(value: V) -> Self {
        Self::new(value, None)
    }
}

impl<V> Expirable for Item<V> {
    #[inline]
    fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }
}

/// Key-less placeholder, used for admission and level queues.
impl Expirable for () {
    #[inline]
    fn expires_at(&self) -> Option<Instant> {
        None
    }
}

/// A key and the record stored for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<K, T> {
    pub key: K,
    pub item: T,
}

impl<K, T> Entry<K, T> {
    pub fn new(key: K, item: T) -> Self {
        Self { key, item }
    }
}

impl<K, V> Entry<K, Item<V>> {
    /// Splits into the `(key, value)` pair handed to eviction callbacks.
    #[inline]
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.item.value)
    }
}

/// Pre-promotion access record for LRU-K. Carries no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub freq: usize,
    pub last_update: Instant,
}

impl HistoryEntry {
    pub fn first_seen(now: Instant) -> Self {
        Self {
            freq: 1,
            last_update: now,
        }
    }

    /// Counts an access at `now`, after losing one point for every full
    /// `window` since the previous update.
    pub fn record_access(&mut self, now: Instant, window: Duration) {
        let elapsed = now.saturating_duration_since(self.last_update);
        let decay = match window.as_nanos() {
            0 => 0,
            w => usize::try_from(elapsed.as_nanos() / w).unwrap_or(usize::MAX),
        };
        self.freq = self.freq.saturating_sub(decay).saturating_add(1);
        self.last_update = now;
    }
}

impl Expirable for HistoryEntry {
    #[inline]
    fn expires_at(&self) -> Option<Instant> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_expiring_item_is_never_expired() {
        let item = Item::never_expiring(1);
        let far = Instant::now() + Duration::from_secs(3600);
        assert!(!item.is_expired_at(far));
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let now = Instant::now();
        let item = Item::new("v", Some(now));
        assert!(!item.is_expired_at(now));
        assert!(item.is_expired_at(now + Duration::from_nanos(1)));
    }

    #[test]
    fn entry_splits_into_callback_pair() {
        let entry = Entry::new("k", Item::never_expiring(7));
        assert_eq!(entry.into_pair(), ("k", 7));
    }

    #[test]
    fn history_starts_at_one() {
        let now = Instant::now();
        let h = HistoryEntry::first_seen(now);
        assert_eq!(h.freq, 1);
        assert_eq!(h.last_update, now);
        assert!(!h.is_expired_at(now + Duration::from_secs(60)));
    }

    #[test]
    fn history_decays_per_full_window() {
        let t0 = Instant::now();
        let window = Duration::from_secs(10);
        let mut h = HistoryEntry::first_seen(t0);

        h.record_access(t0 + Duration::from_secs(9), window);
        assert_eq!(h.freq, 2);

        // 25s idle: two full windows lost, then this access counted.
        h.record_access(t0 + Duration::from_secs(34), window);
        assert_eq!(h.freq, 1);
        assert_eq!(h.last_update, t0 + Duration::from_secs(34));

        h.record_access(t0 + Duration::from_secs(400), window);
        assert_eq!(h.freq, 1);
    }
}
