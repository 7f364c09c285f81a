//! ClickHouse persistence for the enrichment engine.
//!
//! Holds the resolved geocode/weather tables and reads the upstream
//! customer and order tables the enrichment universes are derived from.

pub mod client;
pub mod config;
pub mod health;
pub mod query;
pub mod schema;
pub mod source;
pub mod store;

pub use client::*;
pub use config::*;
pub use query::*;
pub use source::ClickHouseEntitySource;
pub use store::ClickHouseStore;
