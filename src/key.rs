//! Cache key management utilities.

use crate::error::Result;
use serde::Serialize;

/// Builder for resource cache keys.
///
/// A full key is the logical resource name plus the JSON-serialized
/// parameters: `"appointments:{\"page\":1,\"doctor\":\"d_7\"}"`. Serialization
/// of a given params type is deterministic (field order follows the struct),
/// so identical params always produce identical keys.
pub struct ResourceKeyBuilder;

impl ResourceKeyBuilder {
    /// Build the full cache key from a resource name and its parameters.
    pub fn build<P: Serialize>(resource: &str, params: &P) -> Result<String> {
        let serialized = serde_json::to_string(params)?;
        Ok(format!("{}:{}", resource, serialized))
    }

    /// Build a key for a parameterless resource.
    pub fn build_bare(resource: &str) -> String {
        format!("{}:null", resource)
    }

    /// Split a key into its resource name and serialized-params halves.
    pub fn parse(key: &str) -> (&str, &str) {
        match key.split_once(':') {
            Some((resource, params)) => (resource, params),
            None => (key, ""),
        }
    }

    /// Substring match used by pattern-based cache clears.
    pub fn matches(key: &str, pattern: &str) -> bool {
        key.contains(pattern)
    }
}
