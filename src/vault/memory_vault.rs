//! Process-local vault on a sharded concurrent map.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;
use zeroize::Zeroizing;

use super::{Vault, VaultError, DEFAULT_TTL};

/// Writes between two sweeps of expired entries.
pub const DEFAULT_PURGE_INTERVAL: u64 = 256;

struct VaultEntry {
    value: Zeroizing<String>,
    expires_at: Instant,
}

impl VaultEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory vault. Share one instance across requests behind an `Arc`.
///
/// Expired entries are dropped lazily on read, and every
/// `purge_interval`-th write sweeps the whole map first, so memory stays
/// bounded by the entries written within one TTL. Dropped values are
/// zeroized.
pub struct MemoryVault {
    entries: DashMap<String, VaultEntry>,
    ttl: Duration,
    purge_interval: u64,
    writes: AtomicU64,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            purge_interval: DEFAULT_PURGE_INTERVAL,
            writes: AtomicU64::new(0),
        }
    }

    /// Sweep expired entries every `writes` writes (at least every write).
    pub fn with_purge_interval(mut self, writes: u64) -> Self {
        self.purge_interval = writes.max(1);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, remaining = self.entries.len(), "Purged expired vault entries");
        }
        purged
    }

    /// Entries currently held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl Vault for MemoryVault {
    fn store(&self, token: &str, value: &str) -> Result<(), VaultError> {
        let written = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if written % self.purge_interval == 0 {
            // Sweep before taking the entry guard; retain locks every shard.
            self.purge_expired();
        }

        let now = Instant::now();
        let entry = VaultEntry {
            value: Zeroizing::new(value.to_string()),
            expires_at: now + self.ttl,
        };
        match self.entries.entry(token.to_string()) {
            Entry::Occupied(mut slot) => {
                if slot.get().is_live(now) {
                    return Err(VaultError::Occupied(token.to_string()));
                }
                slot.insert(entry);
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
        Ok(())
    }

    fn retrieve(&self, token: &str) -> Result<Option<String>, VaultError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(token) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.to_string()));
            }
        }
        // Guard dropped above; removing while holding it would deadlock the shard.
        self.entries.remove_if(token, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    fn remove(&self, token: &str) -> Result<(), VaultError> {
        self.entries.remove(token);
        Ok(())
    }
}
