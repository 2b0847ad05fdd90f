//! Postcard-based cache serialization with versioned envelopes.
//!
//! This module provides the canonical serialization format for everything
//! the cache store holds. Values are encoded with Postcard and wrapped in a
//! versioned envelope so schema drift between deployments is detected
//! instead of silently misread.
//!
//! # Format
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (4 bytes)│POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "FDKT"              u32 (LE)           postcard::to_allocvec(T)
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic:** the same value always produces identical bytes
//! - **Validated:** magic and version checked on every deserialization
//! - **Versioned:** schema changes force eviction, not silent migration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic header for frontdesk-kit cache entries: b"FDKT"
///
/// Any entry without this signature is rejected during deserialization.
pub const CACHE_MAGIC: [u8; 4] = *b"FDKT";

/// Current schema version.
///
/// Increment when making breaking changes to cached types (adding/removing
/// fields, changing field types, reordering fields, changing enum variants).
/// Old entries are then evicted and refetched from the backend on next
/// access.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope wrapping every cached value.
///
/// Enables corruption detection (bad magic → reject) and schema evolution
/// (version mismatch → evict and refetch).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    /// Magic header: must be b"FDKT"
    pub magic: [u8; 4],
    /// Schema version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
    /// The actual cached value
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    /// Create a new envelope with current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Serialize a value with envelope for cache storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = CacheEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        log::error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Deserialize a value from cache storage with validation.
///
/// Validates the magic header and schema version before handing back the
/// payload.
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: invalid magic header
/// - `Error::VersionMismatch`: schema version mismatch
/// - `Error::DeserializationError`: corrupted Postcard payload
pub fn deserialize_from_cache<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        log::error!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != CACHE_MAGIC {
        log::warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC,
            envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        log::warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION,
            envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}
