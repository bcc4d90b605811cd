//! Cache Module
//!
//! Volatile key-value storage with per-entry TTL and lazy expiry. Used to
//! shield the Steam API from repeated lookups of the same id set.

mod entry;
mod key;
mod stats;
mod store;


pub use entry::CacheEntry;
pub use key::canonical_key;
pub use stats::CacheStats;
pub use store::{CacheStore, SharedCache};

/// Default lifetime of a cached Steam snapshot, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Default interval between background sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
