//! Time-boxed cache for balance lookups.

use crate::config::BalanceCacheConfig;
use parking_lot::Mutex;
use shared_types::{TimeSource, Timestamp};
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
struct Cached<T> {
    value: T,
    updated_at: Timestamp,
}

/// Single-value cache with a TTL measured by an injected clock.
pub struct BalanceCache<T> {
    ttl_ms: u64,
    time: Arc<dyn TimeSource>,
    slot: Mutex<Option<Cached<T>>>,
}

impl<T: Copy> BalanceCache<T> {
    pub fn new(config: BalanceCacheConfig, time: Arc<dyn TimeSource>) -> Self {
        Self {
            ttl_ms: config.ttl_ms,
            time,
            slot: Mutex::new(None),
        }
    }

    /// Cached value if it is younger than the TTL.
    pub fn get(&self) -> Option<T> {
        let now = self.time.now();
        let cached = *self.slot.lock();
        cached
            .filter(|c| now.saturating_sub(c.updated_at) < self.ttl_ms)
            .map(|c| c.value)
    }

    pub fn set(&self, value: T) {
        *self.slot.lock() = Some(Cached {
            value,
            updated_at: self.time.now(),
        });
    }

    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}
