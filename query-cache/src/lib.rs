// Copyright (c) James Kassemi, SC, US. All rights reserved.

use core_types::config::DEFAULT_CACHE_TTL_SECS;
use core_types::{PoolListing, Timestamp};
use parking_lot::Mutex;

/// One bulk-query result, in final order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub records: Vec<PoolListing>,
    pub captured_at: Timestamp,
}

impl CacheEntry {
    pub fn new(records: Vec<PoolListing>, captured_at: Timestamp) -> Self {
        Self {
            records,
            captured_at,
        }
    }
}

/// Single-slot cache for the latest bulk listing.
///
/// Entries are served whole or not at all; the slot is replaced on every
/// `put` and never edited in place.
pub struct QueryCache {
    ttl_secs: i64,
    slot: Mutex<Option<CacheEntry>>,
}

impl QueryCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl_secs,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// The stored entry if it is younger than the TTL at `now`.
    pub fn get(&self, now: Timestamp) -> Option<CacheEntry> {
        let guard = self.slot.lock();
        let entry = guard.as_ref()?;
        if now.saturating_sub(entry.captured_at) < self.ttl_secs {
            Some(entry.clone())
        } else {
            None
        }
    }

    pub fn put(&self, entry: CacheEntry) {
        *self.slot.lock() = Some(entry);
    }

    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }

    /// Age of whatever is stored, fresh or not.
    pub fn age(&self, now: Timestamp) -> Option<i64> {
        self.slot
            .lock()
            .as_ref()
            .map(|entry| now.saturating_sub(entry.captured_at))
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL_SECS)
    }
}
