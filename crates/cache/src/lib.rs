//! Dedup cache backends for the enrichment engine.
//!
//! Both backends implement [`enrich_core::DedupCache`]. Redis is the shared,
//! durable-enough accelerator used in production; the in-process set backs
//! single-shot runs and tests.

pub mod config;
pub mod memory;
pub mod redis_cache;

pub use config::*;
pub use memory::MemoryDedupCache;
pub use redis_cache::RedisDedupCache;
