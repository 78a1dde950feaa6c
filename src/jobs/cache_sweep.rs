//! Background job: sweep expired entries out of the local cache tier.
//!
//! The in-memory tier evicts lazily on read; tokens that are never read again
//! after expiry would otherwise linger. Redis handles its own TTLs.

use std::time::Duration;

use tokio::time;

use crate::cache::TieredCache;

/// Spawn the sweep task. Call this once at startup.
pub fn spawn(cache: TieredCache) {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(3600)); // every hour
        loop {
            interval.tick().await;
            let evicted = cache.evict_expired();
            if evicted > 0 {
                tracing::info!(evicted, remaining = cache.local_len(), "cache sweep");
            }
        }
    });
}
