//! Dedup cache configuration.

use serde::{Deserialize, Serialize};

/// Which dedup cache implementation to run with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    /// In-process set, empty at startup. The store check rebuilds it.
    Memory,
}

/// Dedup cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Redis connection URL
    pub url: String,
    /// Base set name; the weather namespace appends `_weather`
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_key_prefix() -> String {
    "enrich_areas".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            url: "redis://127.0.0.1:6379/0".to_string(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// Independent keyspaces, one per enrichment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Members are area names.
    Geocode,
    /// Members are `area:YYYY-MM-DD`.
    Weather,
}

impl Namespace {
    /// Redis set holding this namespace's members.
    pub fn set_name(&self, prefix: &str) -> String {
        match self {
            Self::Geocode => prefix.to_string(),
            Self::Weather => format!("{}_weather", prefix),
        }
    }
}
