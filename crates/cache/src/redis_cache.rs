//! Redis set per namespace.

use async_trait::async_trait;
use enrich_core::{DedupCache, Error, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

use crate::config::{CacheConfig, Namespace};

/// Dedup cache stored as one Redis set per namespace.
///
/// `SADD` is atomic, so concurrent marks from several workers never lose
/// members. Clones share the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisDedupCache {
    manager: ConnectionManager,
    prefix: String,
    set: String,
}

impl RedisDedupCache {
    /// Connects and returns the geocode namespace.
    #[tracing::instrument(level = "debug", skip(cfg))]
    pub async fn connect(cfg: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(cfg.url.clone())
            .map_err(|e| Error::cache(format!("redis client open: {}", e)))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::cache(format!("redis connect: {}", e)))?;

        info!(url = %cfg.url, prefix = %cfg.key_prefix, "Connected to Redis dedup cache");

        Ok(Self {
            manager,
            set: Namespace::Geocode.set_name(&cfg.key_prefix),
            prefix: cfg.key_prefix.clone(),
        })
    }

    /// Same connection, different keyspace.
    pub fn namespace(&self, namespace: Namespace) -> Self {
        Self {
            manager: self.manager.clone(),
            set: namespace.set_name(&self.prefix),
            prefix: self.prefix.clone(),
        }
    }

    /// Name of the backing Redis set.
    pub fn set_name(&self) -> &str {
        &self.set
    }

    /// Number of members in this namespace.
    pub async fn len(&self) -> Result<u64> {
        let mut conn = self.manager.clone();
        let n: u64 = conn
            .scard(&self.set)
            .await
            .map_err(|e| Error::cache(format!("redis scard: {}", e)))?;
        Ok(n)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::cache(format!("redis ping: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl DedupCache for RedisDedupCache {
    #[tracing::instrument(level = "trace", skip(self))]
    async fn contains(&self, key: &str) -> Result<bool> {
        let mut conn = self.manager.clone();
        conn.sismember(&self.set, key)
            .await
            .map_err(|e| Error::cache(format!("redis sismember: {}", e)))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    async fn mark(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: i64 = conn
            .sadd(&self.set, key)
            .await
            .map_err(|e| Error::cache(format!("redis sadd: {}", e)))?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn
            .del(&self.set)
            .await
            .map_err(|e| Error::cache(format!("redis del: {}", e)))?;
        info!(set = %self.set, removed = removed, "Cleared dedup cache namespace");
        Ok(())
    }
}
