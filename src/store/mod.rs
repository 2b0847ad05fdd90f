//! Cache store implementations.

use crate::error::Result;
use std::time::{Duration, Instant};

pub mod inmemory;

pub use inmemory::InMemoryStore;

/// One cached fetch result: the serialized payload plus the moment it was
/// fetched.
///
/// The store never expires entries on its own; freshness and staleness are
/// computed by resource handles from `fetched_at` against their configured
/// windows. Entries live until explicitly deleted or cleared.
#[derive(Clone, Debug)]
pub struct StoredEntry {
    /// Envelope-serialized payload bytes.
    pub data: Vec<u8>,
    /// When the producing fetch completed.
    pub fetched_at: Instant,
}

impl StoredEntry {
    /// Create an entry stamped with the current time.
    pub fn new(data: Vec<u8>) -> Self {
        StoredEntry {
            data,
            fetched_at: Instant::now(),
        }
    }

    /// Time elapsed since the producing fetch.
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Entry is younger than the freshness window.
    pub fn is_fresh(&self, cache_time: Duration) -> bool {
        self.age() < cache_time
    }

    /// Entry is past the staleness window (still servable, due for refresh).
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        self.age() >= stale_time
    }
}

/// Trait for cache store implementations.
///
/// Abstracts storage so tests can inject an isolated store while production
/// code shares one process-wide instance. Implementations: in-memory
/// (default), or anything custom.
///
/// **IMPORTANT:** All methods use `&self` to allow concurrent access.
/// Implementations should use interior mutability.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait CacheStore: Send + Sync + Clone {
    /// Retrieve an entry by key.
    ///
    /// # Returns
    /// - `Ok(Some(entry))` - entry present (possibly stale; the caller decides)
    /// - `Ok(None)` - no entry for this key
    ///
    /// # Errors
    /// Returns `Err` if the store itself fails.
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>>;

    /// Store an entry, replacing any previous one for the key.
    ///
    /// # Errors
    /// Returns `Err` if the store itself fails.
    async fn set(&self, key: &str, entry: StoredEntry) -> Result<()>;

    /// Remove an entry.
    ///
    /// # Errors
    /// Returns `Err` if the store itself fails.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check whether an entry exists (optional optimization).
    ///
    /// # Errors
    /// Returns `Err` if the store itself fails.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Remove every entry. For session resets (e.g. logout).
    ///
    /// # Errors
    /// Returns `Err` if the store itself fails.
    async fn clear_all(&self) -> Result<()>;

    /// Remove every entry whose key contains `pattern`; returns how many
    /// were removed.
    ///
    /// # Errors
    /// Returns `Err` if the store itself fails.
    async fn clear_by_pattern(&self, pattern: &str) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_exists_default() {
        let store = InMemoryStore::new();
        store
            .set("key", StoredEntry::new(vec![1, 2, 3]))
            .await
            .expect("Failed to set key");
        assert!(store.exists("key").await.expect("Failed to check exists"));
        assert!(!store
            .exists("nonexistent")
            .await
            .expect("Failed to check exists"));
    }

    #[test]
    fn test_entry_freshness_windows() {
        let entry = StoredEntry::new(vec![]);
        assert!(entry.is_fresh(Duration::from_secs(60)));
        assert!(!entry.is_stale(Duration::from_secs(60)));
        // A zero-length window means immediately stale, never fresh.
        assert!(!entry.is_fresh(Duration::ZERO));
        assert!(entry.is_stale(Duration::ZERO));
    }
}
