//! Enrichment workers.
//!
//! - Pool: paced, bounded fan-out of remote lookups
//! - Geocode: area → coordinates, resolved once per area
//! - Weather: (area, date) → daily weather over the order date range
//! - Pipeline: geocode then weather, one pass

pub mod geocode;
pub mod pacer;
pub mod pipeline;
pub mod pool;
mod reconcile;
pub mod report;
pub mod weather;

pub use geocode::{GeocodeEnrichment, GeocodeJob};
pub use pacer::Pacer;
pub use pipeline::*;
pub use pool::*;
pub use reconcile::Resolution;
pub use report::EnrichmentReport;
pub use weather::{WeatherEnrichment, WeatherJob};
