//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A cached value together with the moment it was stored and its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value was written
    pub stored_at: Instant,
    /// Lifetime measured from `stored_at`
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stored at `now`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_seconds` - TTL in seconds
    /// * `now` - Storage instant
    pub fn new(value: V, ttl_seconds: u64, now: Instant) -> Self {
        Self {
            value,
            stored_at: now,
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Instant at which the entry stops being served.
    pub fn expires_at(&self) -> Instant {
        self.stored_at + self.ttl
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= stored_at + ttl`,
    /// so a zero TTL entry is never served.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`, saturating at zero.
    pub fn ttl_remaining_at(&self, now: Instant) -> Duration {
        self.expires_at().saturating_duration_since(now)
    }
}
