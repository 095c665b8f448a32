//! In-memory grant cache
//!
//! Maps a capability key to the most recent grant id believed usable.
//! A hit is only a hint: the broker re-checks the grant with the authority
//! before reusing it.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::types::CapabilityKey;

/// Process-local grant id cache.
///
/// Holds at most one id per key and never persists. Concurrent writers on
/// the same key race with last-write-wins semantics; nothing serializes
/// grant creation across callers.
#[derive(Debug, Default)]
pub struct GrantCache {
    entries: RwLock<HashMap<CapabilityKey, String>>,
}

impl GrantCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached grant id for a key, if any
    pub fn get(&self, key: &CapabilityKey) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Remember a grant id for a key, replacing whatever was there
    pub fn put(&self, key: CapabilityKey, id: impl Into<String>) {
        let id = id.into();
        tracing::debug!("Caching grant {} for {}", id, key);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, id);
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
