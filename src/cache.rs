//! Volume location cache.
//!
//! Maps a [`VolumeId`] to the replica addresses the master reported for it,
//! and dispenses those addresses round-robin so repeated fetches for the same
//! volume spread across its replicas. This is the only shared mutable state
//! in the origin; a single `parking_lot::RwLock` protects the whole map and
//! is never held across a network call.
//!
//! Entries optionally expire after a TTL. An expired entry behaves exactly
//! like a miss: it is dropped and the caller goes back to the master. With no
//! TTL configured an entry lives until it is replaced or explicitly removed,
//! matching the assumption that volume placement is stable for the process
//! lifetime.

use crate::types::VolumeId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Total number of cache hits.
    pub hits: u64,
    /// Total number of cache misses.
    pub misses: u64,
    /// Current number of cached volumes.
    pub entries: usize,
}

impl CacheStats {
    /// Calculate hit ratio.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// A cached replica list and its rotation cursor.
struct CacheEntry {
    /// Replica addresses in the order the master reported them.
    addresses: Vec<String>,
    /// Index of the next address to dispense. May equal `addresses.len()`;
    /// the wrap check happens at dispense time.
    cursor: usize,
    /// When this entry was stored.
    cached_at: Instant,
}

impl CacheEntry {
    fn new(addresses: Vec<String>) -> Self {
        Self {
            addresses,
            cursor: 0,
            cached_at: Instant::now(),
        }
    }

    fn expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => self.cached_at.elapsed() > ttl,
            None => false,
        }
    }
}

/// Thread-safe volume id to replica address cache with round-robin dispensing.
pub struct VolumeCache {
    entries: RwLock<HashMap<VolumeId, CacheEntry>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl VolumeCache {
    /// Create a cache whose entries never expire.
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    /// Create a cache whose entries expire `ttl` after insertion. `None`
    /// disables expiry.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Store the replica addresses for a volume, replacing any previous list
    /// and resetting the rotation cursor to the front.
    pub fn insert(&self, id: VolumeId, addresses: Vec<String>) {
        let mut entries = self.entries.write();
        entries.insert(id, CacheEntry::new(addresses));
    }

    /// Return all cached addresses for a volume without touching the
    /// rotation cursor.
    pub fn get(&self, id: VolumeId) -> Option<Vec<String>> {
        let entries = self.entries.read();
        entries
            .get(&id)
            .filter(|e| !e.expired(self.ttl))
            .map(|e| e.addresses.clone())
    }

    /// Dispense the next address for a volume in round-robin order.
    ///
    /// Returns `None` when the volume is unknown, its entry has expired, or
    /// its address list is empty; all three count as misses and the caller is
    /// expected to consult the master. The read-modify-write of the cursor
    /// happens under the write lock, so concurrent callers each observe a
    /// consistent (list, cursor) pair and no advancement is lost.
    pub fn next(&self, id: VolumeId) -> Option<String> {
        let mut entries = self.entries.write();

        if let Some(entry) = entries.get(&id) {
            if entry.expired(self.ttl) {
                entries.remove(&id);
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        }

        let entry = match entries.get_mut(&id) {
            Some(entry) if !entry.addresses.is_empty() => entry,
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if entry.cursor >= entry.addresses.len() {
            entry.cursor = 0;
        }
        let address = entry.addresses[entry.cursor].clone();
        entry.cursor += 1;

        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(address)
    }

    /// Remove the entry for a volume. Removing an unknown volume is a no-op.
    pub fn remove(&self, id: VolumeId) {
        let mut entries = self.entries.write();
        entries.remove(&id);
    }

    /// Drop all entries and cursors.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
    }

    /// Number of cached volumes.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for VolumeCache {
    fn default() -> Self {
        Self::new()
    }
}
