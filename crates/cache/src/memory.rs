//! In-process dedup cache.

use async_trait::async_trait;
use enrich_core::{DedupCache, Result};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Dedup cache held in memory for the lifetime of the process.
///
/// Clones share the same set.
#[derive(Clone, Default)]
pub struct MemoryDedupCache {
    keys: Arc<RwLock<HashSet<String>>>,
}

impl MemoryDedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated cache.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: Arc::new(RwLock::new(keys.into_iter().map(Into::into).collect())),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    /// Sorted copy of every member.
    pub fn snapshot(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys.read().iter().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl DedupCache for MemoryDedupCache {
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.keys.read().contains(key))
    }

    async fn mark(&self, key: &str) -> Result<()> {
        self.keys.write().insert(key.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.keys.write().clear();
        Ok(())
    }
}
