//! Telemetry for the enrichment engine: structured logging setup and
//! in-process counters summarised at the end of each run.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
