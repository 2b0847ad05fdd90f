//! In-memory cache store (default, thread-safe, async).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Entries are never evicted by size, age, or LRU; the map grows for the
//! lifetime of the process unless explicitly cleared.

use super::{CacheStore, StoredEntry};
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe async in-memory cache store.
///
/// Uses DashMap for lock-free concurrent access with fine-grained per-key
/// sharding. No async locks required - operations are non-blocking.
///
/// # Example
///
/// ```no_run
/// use frontdesk_kit::store::{CacheStore, InMemoryStore, StoredEntry};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     store.set("appointments:null", StoredEntry::new(b"payload".to_vec())).await?;
///
///     let entry = store.get("appointments:null").await?;
///     assert!(entry.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, StoredEntry>>,
}

impl InMemoryStore {
    /// Create a new in-memory cache store.
    pub fn new() -> Self {
        InMemoryStore {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Get the current number of entries.
    pub async fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get memory statistics.
    pub async fn stats(&self) -> StoreStats {
        let total_bytes: usize = self.entries.iter().map(|entry| entry.data.len()).sum();

        StoreStats {
            total_entries: self.entries.len(),
            total_bytes,
        }
    }

    /// Print store statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Store Stats: {} entries, {} bytes",
            stats.total_entries, stats.total_bytes
        );
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>> {
        if let Some(entry) = self.entries.get(key) {
            debug!("✓ InMemory GET {} -> HIT (age {:?})", key, entry.age());
            return Ok(Some(entry.clone()));
        }

        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, entry: StoredEntry) -> Result<()> {
        debug!("✓ InMemory SET {} ({} bytes)", key, entry.data.len());
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entries.contains_key(key))
    }

    async fn clear_all(&self) -> Result<()> {
        self.entries.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - all cache cleared!");
        Ok(())
    }

    async fn clear_by_pattern(&self, pattern: &str) -> Result<usize> {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(pattern));
        let removed = before - self.entries.len();
        debug!("✓ InMemory CLEAR_BY_PATTERN '{}' removed {}", pattern, removed);
        Ok(removed)
    }
}

/// Store statistics.
#[derive(Clone, Debug)]
pub struct StoreStats {
    pub total_entries: usize,
    pub total_bytes: usize,
}
